//! Integration tests for the optimization pipeline

use resume_optimizer::config::Config;
use resume_optimizer::matching::embeddings::TokenHashEmbedder;
use resume_optimizer::model::resume::SectionId;
use resume_optimizer::pipeline::collaborators::{
    BuiltinProjectCatalog, HeuristicResumeParser, ProjectSuggestion, TemplateBulletRewriter,
};
use resume_optimizer::pipeline::context::PipelineExecutionContext;
use resume_optimizer::pipeline::controller::{PipelineController, StepInput};
use resume_optimizer::pipeline::step::PipelineStep;
use resume_optimizer::pipeline::store::{FileStore, MemoryStore, SessionStore};

const RESUME: &str = "\
Jane Smith
jane@example.com

Summary:
Backend engineer focused on reliable, measurable systems.

Experience:
Software Engineer at Acme (2020-2024)
- Built REST APIs serving 2M requests per day
- Reduced deployment time by 60% with CI automation

Education:
BSc Computer Science, State University (2020)

Skills:
Languages: Python, Rust
";

const JD: &str = "Backend engineer role. Must have Python and PostgreSQL experience. \
                  Docker knowledge preferred. You will design and operate REST APIs.";

fn controller_with_store(dir: &std::path::Path) -> PipelineController<FileStore> {
    PipelineController::new_session(
        Config::default(),
        FileStore::new(dir.to_path_buf()).unwrap(),
        Box::new(HeuristicResumeParser),
        Box::new(TemplateBulletRewriter),
        Box::new(BuiltinProjectCatalog),
        Box::new(TokenHashEmbedder::default()),
        "user-1",
        JD,
        Some("Backend Engineer".to_string()),
    )
    .unwrap()
}

fn input_for(step: PipelineStep) -> StepInput {
    match step {
        PipelineStep::ParseResume => StepInput {
            resume_text: Some(RESUME.to_string()),
            ..Default::default()
        },
        PipelineStep::MissingSectionsModal => StepInput {
            provided_sections: Some(vec![(
                SectionId::Certifications,
                "AWS Certified Developer".to_string(),
            )]),
            ..Default::default()
        },
        PipelineStep::ProjectAnalysis => StepInput {
            approved_projects: Some(vec![ProjectSuggestion {
                title: "URL shortener with analytics".to_string(),
                url: None,
                description: "REST API with rate limiting backed by PostgreSQL".to_string(),
            }]),
            ..Default::default()
        },
        _ => StepInput::default(),
    }
}

#[tokio::test]
async fn pipeline_runs_all_eight_steps_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = controller_with_store(dir.path());

    let mut input_requests = Vec::new();
    for step in PipelineStep::ALL {
        assert_eq!(ctl.context().current_step, step);

        // First attempt without answers; interactive steps will gate
        let result = ctl.execute_step(StepInput::default()).await.unwrap();
        let result = if result.user_input_required && result.success {
            input_requests.push(step);
            ctl.execute_step(input_for(step)).await.unwrap()
        } else if !result.success {
            // Parsing needs the resume text up front
            ctl.execute_step(input_for(step)).await.unwrap()
        } else {
            result
        };
        assert!(result.success, "step {:?} failed: {:?}", step, result.error);

        if step != PipelineStep::OutputResume {
            ctl.proceed_to_next_step().unwrap();
        }
    }

    // Only the two gated steps ever asked for input
    assert_eq!(
        input_requests,
        vec![
            PipelineStep::MissingSectionsModal,
            PipelineStep::ProjectAnalysis
        ]
    );
    assert_eq!(ctl.progress().percentage_complete, 100);

    // The final snapshot carries the user's additions
    let final_version = ctl.context().latest_resume().unwrap();
    assert!(final_version
        .snapshot
        .certifications
        .iter()
        .any(|c| c.contains("AWS")));
    assert!(final_version
        .snapshot
        .projects
        .iter()
        .any(|p| p.title.contains("URL shortener")));
}

#[tokio::test]
async fn progress_hits_100_only_after_the_output_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = controller_with_store(dir.path());

    for step in PipelineStep::ALL {
        let result = ctl.execute_step(input_for(step)).await.unwrap();
        assert!(result.success);
        let progress = ctl.progress().percentage_complete;
        if step == PipelineStep::OutputResume {
            assert_eq!(progress, 100);
        } else {
            assert!(progress < 100, "progress {} at step {:?}", progress, step);
            ctl.proceed_to_next_step().unwrap();
        }
    }
}

#[tokio::test]
async fn session_survives_a_process_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let session_id;

    {
        let mut ctl = controller_with_store(dir.path());
        session_id = ctl.session_id().to_string();
        ctl.execute_step(input_for(PipelineStep::ParseResume))
            .await
            .unwrap();
        ctl.proceed_to_next_step().unwrap();
    }

    // New controller, same storage directory
    let mut ctl = PipelineController::resume_session(
        Config::default(),
        FileStore::new(dir.path().to_path_buf()).unwrap(),
        Box::new(HeuristicResumeParser),
        Box::new(TemplateBulletRewriter),
        Box::new(BuiltinProjectCatalog),
        Box::new(TokenHashEmbedder::default()),
        &session_id,
    )
    .unwrap();

    assert_eq!(ctl.context().current_step, PipelineStep::AnalyzeAgainstJd);
    assert!(ctl
        .context()
        .is_step_completed(PipelineStep::ParseResume));
    assert_eq!(ctl.context().resume_versions.len(), 1);

    let result = ctl.execute_step(StepInput::default()).await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn rollback_reruns_a_step_without_losing_versions() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = controller_with_store(dir.path());

    ctl.execute_step(input_for(PipelineStep::ParseResume))
        .await
        .unwrap();
    ctl.proceed_to_next_step().unwrap();
    ctl.execute_step(StepInput::default()).await.unwrap();

    let versions = ctl.context().resume_versions.len();
    let step = ctl.rollback_to_previous_step().unwrap();
    assert_eq!(step, PipelineStep::ParseResume);
    assert_eq!(ctl.context().resume_versions.len(), versions);

    // The step re-runs and completes again
    let result = ctl
        .execute_step(input_for(PipelineStep::ParseResume))
        .await
        .unwrap();
    assert!(result.success);
    assert!(ctl.context().is_step_completed(PipelineStep::ParseResume));
}

#[test]
fn session_store_caps_at_ten_sessions() {
    let store = SessionStore::new(MemoryStore::new(), 10, 24);
    let mut ids = Vec::new();
    for i in 0..11 {
        let mut ctx = PipelineExecutionContext::new("user-1", JD, None);
        ctx.started_at = chrono::Utc::now() - chrono::Duration::minutes(120 - i);
        ids.push(ctx.session_id.clone());
        store.save(&ctx).unwrap();
    }

    assert!(store.load(&ids[0]).is_err(), "oldest should be evicted");
    for id in &ids[1..] {
        assert!(store.load(id).is_ok());
    }
}

#[test]
fn expired_sessions_are_not_resumable() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(FileStore::new(dir.path().to_path_buf()).unwrap(), 10, 24);
    let mut ctx = PipelineExecutionContext::new("user-1", JD, None);
    ctx.started_at = chrono::Utc::now() - chrono::Duration::hours(25);
    store.save(&ctx).unwrap();

    assert!(!store.can_resume(&ctx.session_id).unwrap());

    let err = PipelineController::resume_session(
        Config::default(),
        FileStore::new(dir.path().to_path_buf()).unwrap(),
        Box::new(HeuristicResumeParser),
        Box::new(TemplateBulletRewriter),
        Box::new(BuiltinProjectCatalog),
        Box::new(TokenHashEmbedder::default()),
        &ctx.session_id,
    );
    assert!(err.is_err());
}

#[tokio::test]
async fn declined_suggestions_leave_the_resume_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = controller_with_store(dir.path());

    ctl.execute_step(input_for(PipelineStep::ParseResume))
        .await
        .unwrap();
    let projects_before = ctl
        .context()
        .latest_resume()
        .unwrap()
        .snapshot
        .projects
        .len();
    ctl.proceed_to_next_step().unwrap();
    ctl.execute_step(StepInput::default()).await.unwrap();
    ctl.proceed_to_next_step().unwrap();

    // Decline both gates
    let decline_sections = StepInput {
        provided_sections: Some(vec![]),
        ..Default::default()
    };
    let result = ctl.execute_step(decline_sections).await.unwrap();
    assert!(result.success && !result.user_input_required);
    ctl.proceed_to_next_step().unwrap();

    let decline_projects = StepInput {
        approved_projects: Some(vec![]),
        ..Default::default()
    };
    let result = ctl.execute_step(decline_projects).await.unwrap();
    assert!(result.success && !result.user_input_required);

    let projects_after = ctl
        .context()
        .latest_resume()
        .unwrap()
        .snapshot
        .projects
        .len();
    assert_eq!(projects_before, projects_after);
}
