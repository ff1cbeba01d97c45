//! Start-of-build notifications

use build_notify::{
    BuildPhase, BuildResult, BuildSnapshotBuilder, CauseKind, Color, Commit, CustomMessages,
    DecisionEngine, Notification, Policy,
};

fn user_triggered() -> BuildSnapshotBuilder {
    BuildSnapshotBuilder::new()
        .project_display_name("something")
        .display_name("else")
        .cause(CauseKind::User, "this one thing")
        .url("http://localhost/some/build")
}

fn scm_triggered_with_changes() -> BuildSnapshotBuilder {
    BuildSnapshotBuilder::new()
        .project_display_name("Project")
        .display_name("Build 4")
        .url("http://localhost/job/project/build/4")
        .cause(CauseKind::Scm, "Started by an SCM change")
        .change_set(vec![
            Commit::new("Old MacDonald", "Add farm").with_affected_files(10),
            Commit::new("Andrea T. Developer", "Fix fence").with_affected_files(5),
        ])
}

#[test]
fn test_no_previous_build_without_custom_message() {
    let engine = DecisionEngine::new(Policy::default());
    let build = user_triggered().build();

    let actual = engine.on_start(&build);

    assert_eq!(
        actual,
        Notification::good("something - else this one thing (<http://localhost/some/build|Open>)")
    );
}

#[test]
fn test_previous_failure_turns_start_danger() {
    let engine = DecisionEngine::new(Policy::default());
    let build = user_triggered().previous(BuildResult::Failure).build();

    let actual = engine.on_start(&build);

    assert_eq!(
        actual,
        Notification::new(
            "something - else this one thing (<http://localhost/some/build|Open>)",
            Color::Danger
        )
    );
}

#[test]
fn test_previous_success_keeps_start_good() {
    let engine = DecisionEngine::new(Policy::default());
    let build = user_triggered().previous(BuildResult::Success).build();
    assert_eq!(engine.on_start(&build).color, Color::Good);
}

#[test]
fn test_scm_trigger_lists_changes() {
    let engine = DecisionEngine::new(Policy::default());
    let build = scm_triggered_with_changes().build();

    let actual = engine.on_start(&build);

    assert_eq!(
        actual.text,
        "Project - Build 4 Started by changes from Andrea T. Developer, Old MacDonald \
         (15 file(s) changed) (<http://localhost/job/project/build/4|Open>)"
    );
    assert_eq!(actual.color, Color::Good);
}

#[test]
fn test_trigger_cause_wins_over_change_set() {
    let engine = DecisionEngine::new(Policy::default());
    let build = scm_triggered_with_changes()
        .cause(CauseKind::Timer, "Started by timer")
        .build();
    // SCM cause is still present, so this is not a non-SCM trigger
    assert!(engine.on_start(&build).text.contains("Started by changes"));

    let build = BuildSnapshotBuilder::new()
        .project_display_name("Project")
        .display_name("Build 5")
        .url("http://localhost/job/project/build/5")
        .cause(CauseKind::User, "Started by user ann")
        .change_set(vec![Commit::new("ann", "Tweak").with_affected_files(1)])
        .build();
    let text = engine.on_start(&build).text;
    assert!(!text.contains("Started by changes"), "{}", text);
    assert!(text.contains("Started by user ann"));
}

#[test]
fn test_empty_change_set_falls_back_to_status() {
    let engine = DecisionEngine::new(Policy::default());
    let build = BuildSnapshotBuilder::new()
        .project_display_name("Project")
        .display_name("Build 6")
        .url("http://localhost/6")
        .human_duration("0 ms")
        .cause(CauseKind::Scm, "Started by an SCM change")
        .change_set(vec![])
        .build();

    let actual = engine.on_start(&build);

    assert_eq!(actual.text, "Project - Build 6 Unknown after 0 ms (<http://localhost/6|Open>)");
}

#[test]
fn test_start_with_custom_message() {
    let engine = DecisionEngine::new(Policy {
        include_custom_message: true,
        custom_messages: CustomMessages {
            default: Some("deploying $PROJECT_NAME".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });
    let build = user_triggered().build();

    assert_eq!(
        engine.on_start(&build).text,
        "something - else this one thing (<http://localhost/some/build|Open>)\ndeploying something"
    );
}

#[test]
fn test_evaluate_start_matches_on_start() {
    let engine = DecisionEngine::new(Policy::default());
    let build = scm_triggered_with_changes().previous(BuildResult::Unstable).build();
    assert_eq!(engine.evaluate(BuildPhase::Start, &build), Some(engine.on_start(&build)));
}
