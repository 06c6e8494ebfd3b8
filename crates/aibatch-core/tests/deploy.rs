use std::{fs, path::Path, sync::Arc};

use aibatch_core::{
    engine::{ResourceArgs, ResourceKind},
    prelude::*,
};
use aibatch_model::{ArtifactKind, Flag, JobSpec, MAX_RESOURCE_NAME_LEN, Namer};
use tempfile::TempDir;

const COMPONENT: &str = "test-vertex-batch";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for f in [
            "model/saved_model.pb",
            "model/variables/variables.data-00000-of-00001",
            "model/input_schema.yaml",
            "model/output_schema.yaml",
            "model/.DS_Store",
            "inputs/data1.jsonl",
            "inputs/data2.jsonl",
        ] {
            let path = dir.path().join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"x").unwrap();
        }
        Self { dir }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.dir.path().join(rel)
    }

    fn directory_spec(&self) -> JobSpec {
        JobSpec {
            project: "test-project".into(),
            region: "us-central1".into(),
            model_dir: Some(self.path("model")),
            input_schema_path: Some("input_schema.yaml".into()),
            output_schema_path: Some("output_schema.yaml".into()),
            input_data_path: Some(self.path("inputs")),
            ..Default::default()
        }
    }

    fn catalog_spec(&self) -> JobSpec {
        JobSpec {
            model_dir: None,
            model_name: Some("publishers/google/models/gemma".into()),
            input_schema_path: None,
            output_schema_path: None,
            ..self.directory_spec()
        }
    }
}

async fn run(engine: &Arc<PlanEngine>, spec: JobSpec) -> Result<DeploymentResult, CoreError> {
    AiBatch::new(engine.clone()).deploy(COMPONENT, spec).await
}

fn job_name(plan: &ResourcePlan) -> String {
    plan.of_kind(ResourceKind::BatchPredictionJob)
        .next()
        .unwrap()
        .reference
        .name
        .clone()
}

#[tokio::test]
async fn directory_model_is_uploaded_deployed_and_submitted() {
    let fx = Fixture::new();
    let engine = Arc::new(PlanEngine::new());

    let result = run(&engine, fx.directory_spec()).await.unwrap();

    let mut keys = result.uploaded_keys();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "inputs/data1.jsonl",
            "inputs/data2.jsonl",
            "model/input_schema.yaml",
            "model/output_schema.yaml",
            "model/saved_model.pb",
            "model/variables/variables.data-00000-of-00001",
        ]
    );
    assert_eq!(result.uploaded_of_kind(ArtifactKind::ModelArtifact).count(), 4);
    assert_eq!(result.uploaded_of_kind(ArtifactKind::InputData).count(), 2);

    assert_eq!(result.artifacts_bucket_name, "test-vertex-batch-vertex-model-bucket");
    assert_eq!(
        result.model_artifacts_bucket_uri.as_deref(),
        Some("gs://test-vertex-batch-vertex-model-bucket/model")
    );
    assert_eq!(
        result.input_schema_uri.as_deref(),
        Some("gs://test-vertex-batch-vertex-model-bucket/model/input_schema.yaml")
    );
    assert_eq!(
        result.input_data_uri,
        "gs://test-vertex-batch-vertex-model-bucket/inputs/*.jsonl"
    );
    assert_eq!(
        result.output_data_uri_prefix,
        "gs://test-vertex-batch-vertex-model-bucket/predictions/"
    );
    assert_eq!(
        result.service_account_email,
        "test-vertex-batc-model-account@test-project.iam.gserviceaccount.com"
    );
    assert_eq!(result.job_state, "JOB_STATE_QUEUED");
    assert_eq!(result.job_display_name, COMPONENT);
    assert!(result.model.starts_with("projects/test-project/locations/us-central1/models/"));
    assert_eq!(result.behavior_schema_uri, None);

    let exports = result.exports();
    for key in [
        "vertex_ai_batch_model_service_account_email",
        "vertex_ai_batch_job_id",
        "vertex_ai_batch_job_name",
        "vertex_ai_batch_job_state",
        "vertex_ai_batch_artifacts_bucket_name",
        "vertex_ai_batch_deployed_model_id",
    ] {
        assert!(
            exports.get(key).is_some_and(|v| !v.is_null()),
            "missing export {key}"
        );
    }
    assert_eq!(
        exports["vertex_ai_batch_uploaded_model_files"]
            .as_array()
            .unwrap()
            .len(),
        6
    );
}

#[tokio::test]
async fn declarations_are_ordered_by_dependencies() {
    let fx = Fixture::new();
    let engine = Arc::new(PlanEngine::new());
    run(&engine, fx.directory_spec()).await.unwrap();

    let plan = engine.plan();
    let job = job_name(&plan);
    let deployment = plan
        .of_kind(ResourceKind::ModelDeployment)
        .next()
        .unwrap()
        .reference
        .name
        .clone();

    assert!(plan.waits_for(&job, &deployment));
    for obj in plan.of_kind(ResourceKind::BucketObject) {
        let name = obj.reference.name.as_str();
        assert!(plan.waits_for(name, "test-vertex-batch-vertex-model-bucket"));
        if name.starts_with("file-model-") {
            assert!(plan.waits_for(&deployment, name), "{name}");
        } else {
            assert!(plan.waits_for(&job, name), "{name}");
        }
    }
    for member in plan.of_kind(ResourceKind::ProjectIamMember) {
        assert!(plan.waits_for(&job, &member.reference.name));
    }
    assert_eq!(plan.of_kind(ResourceKind::ProjectIamMember).count(), 5);

    for r in plan.resources() {
        if r.reference.kind != ResourceKind::Component {
            assert_eq!(r.parent.as_deref(), Some(COMPONENT), "{}", r.reference.name);
        }
    }

    let order = plan.execution_order();
    let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert!(pos(&deployment) < pos(&job));
    assert_eq!(order[0], COMPONENT);
}

#[tokio::test]
async fn catalog_model_skips_model_upload_and_deployment() {
    let fx = Fixture::new();
    let engine = Arc::new(PlanEngine::new());

    let result = run(&engine, fx.catalog_spec()).await.unwrap();

    assert_eq!(result.uploaded_of_kind(ArtifactKind::ModelArtifact).count(), 0);
    assert_eq!(result.uploaded_of_kind(ArtifactKind::InputData).count(), 2);
    assert_eq!(result.model, "publishers/google/models/gemma");
    assert!(result.deployed_model_id.is_none());
    assert!(result.model_artifacts_bucket_uri.is_none());
    assert!(result.exports()["vertex_ai_batch_deployed_model_id"].is_null());

    let plan = engine.plan();
    assert_eq!(plan.of_kind(ResourceKind::ModelDeployment).count(), 0);
    assert_eq!(plan.of_kind(ResourceKind::BatchPredictionJob).count(), 1);

    let job = plan.get(&job_name(&plan)).unwrap();
    match &job.args {
        ResourceArgs::BatchPredictionJob(args) => {
            assert_eq!(args.model, "publishers/google/models/gemma");
        }
        other => panic!("unexpected args {other:?}"),
    }
}

#[tokio::test]
async fn each_run_submits_a_new_job() {
    let fx = Fixture::new();
    let first = Arc::new(PlanEngine::new());
    let second = Arc::new(PlanEngine::new());

    let a = run(&first, fx.directory_spec()).await.unwrap();
    let b = run(&second, fx.directory_spec()).await.unwrap();

    assert_ne!(a.job_id, b.job_id);
    assert_ne!(job_name(&first.plan()), job_name(&second.plan()));
    assert_eq!(a.artifacts_bucket_name, b.artifacts_bucket_name);
}

#[tokio::test]
async fn invalid_spec_declares_nothing() {
    let fx = Fixture::new();
    let cases = [
        (JobSpec { project: "".into(), ..fx.directory_spec() }, "project is required"),
        (JobSpec { region: "".into(), ..fx.directory_spec() }, "region is required"),
        (
            JobSpec { model_dir: None, ..fx.directory_spec() },
            "model directory or model name is required",
        ),
        (
            JobSpec { input_schema_path: None, ..fx.directory_spec() },
            "model prediction input schema path is required",
        ),
        (
            JobSpec { output_schema_path: None, ..fx.directory_spec() },
            "model prediction output schema path is required",
        ),
    ];

    for (spec, message) in cases {
        let engine = Arc::new(PlanEngine::new());
        let err = run(&engine, spec).await.unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert_eq!(err.to_string(), message);
        assert!(engine.is_empty(), "{message}");
    }
}

#[tokio::test]
async fn failed_role_binding_names_step_and_role() {
    let fx = Fixture::new();
    let binding = Namer::new(COMPONENT).resource_name(
        "model-sa-iam",
        "roles/logging.logWriter",
        MAX_RESOURCE_NAME_LEN,
    );
    let engine = Arc::new(PlanEngine::new().reject_name(binding.clone(), "permission denied"));

    let err = run(&engine, fx.directory_spec()).await.unwrap_err();

    assert_eq!(err.step(), Some(Step::GrantModelRoles));
    assert_eq!(
        err.to_string(),
        format!(
            "failed to grant model IAM roles: failed to bind role roles/logging.logWriter: \
             declaration of {binding} rejected: permission denied"
        )
    );
    let plan = engine.plan();
    assert_eq!(plan.of_kind(ResourceKind::ProjectIamMember).count(), 2);
    assert_eq!(plan.of_kind(ResourceKind::Bucket).count(), 0);
}

#[tokio::test]
async fn upload_failure_aborts_before_deployment() {
    let fx = Fixture::new();
    let engine = Arc::new(PlanEngine::new().reject_kind(ResourceKind::BucketObject, "quota"));

    let err = run(&engine, fx.directory_spec()).await.unwrap_err();

    assert_eq!(err.step(), Some(Step::UploadModel));
    let message = err.to_string();
    assert!(
        message.starts_with("failed to upload model to bucket: error creating bucket object for"),
        "{message}"
    );
    let plan = engine.plan();
    assert_eq!(plan.of_kind(ResourceKind::ModelDeployment).count(), 0);
    assert_eq!(plan.of_kind(ResourceKind::BatchPredictionJob).count(), 0);
}

#[tokio::test]
async fn missing_input_directory_fails_input_upload() {
    let fx = Fixture::new();
    let spec = JobSpec {
        input_data_path: Some(fx.path("does-not-exist")),
        ..fx.directory_spec()
    };
    let engine = Arc::new(PlanEngine::new());

    let err = run(&engine, spec).await.unwrap_err();

    assert_eq!(err.step(), Some(Step::UploadInputData));
    match err {
        CoreError::Step {
            source: StepError::Upload(upload),
            ..
        } => assert!(upload.path().ends_with(Path::new("does-not-exist"))),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn private_registry_access_binds_repository_reader() {
    let fx = Fixture::new();
    let spec = JobSpec {
        model_image_url: Some("us-docker.pkg.dev/my-project/my-repo/server:1.0".into()),
        enable_private_registry_access: Flag::enabled(),
        ..fx.directory_spec()
    };
    let engine = Arc::new(PlanEngine::new());
    let result = run(&engine, spec).await.unwrap();

    let plan = engine.plan();
    let binding = plan
        .of_kind(ResourceKind::RepositoryIamMember)
        .next()
        .unwrap();
    match &binding.args {
        ResourceArgs::RepositoryIamMember(args) => {
            assert_eq!(args.repository, "my-repo");
            assert_eq!(args.role, "roles/artifactregistry.reader");
            assert_eq!(args.location, "us-central1");
            assert_eq!(args.member, format!("serviceAccount:{}", result.service_account_email));
        }
        other => panic!("unexpected args {other:?}"),
    }
    assert!(plan.waits_for(&job_name(&plan), &binding.reference.name));
    assert_eq!(
        result.model_image_url.as_deref(),
        Some("us-docker.pkg.dev/my-project/my-repo/server:1.0")
    );
}

#[tokio::test]
async fn job_carries_sizing_labels_and_retention() {
    let fx = Fixture::new();
    let spec = JobSpec {
        machine_type: Some("n1-standard-8".into()),
        starting_replica_count: Some(2),
        max_replica_count: Some(6),
        batch_size: Some(32),
        labels: "team=ml".parse().unwrap(),
        retain_job_on_delete: Flag::enabled(),
        ..fx.directory_spec()
    };
    let engine = Arc::new(PlanEngine::new());
    run(&engine, spec).await.unwrap();

    let plan = engine.plan();
    let job = plan.get(&job_name(&plan)).unwrap();
    assert!(job.retain_on_delete);
    match &job.args {
        ResourceArgs::BatchPredictionJob(args) => {
            assert_eq!(args.machine.machine_type, "n1-standard-8");
            assert_eq!(args.machine.replicas.starting, 2);
            assert_eq!(args.machine.replicas.max, 6);
            assert_eq!(args.batch_size, 32);
            assert_eq!(args.labels.get("team"), Some("ml"));
        }
        other => panic!("unexpected args {other:?}"),
    }

    let bucket = plan.of_kind(ResourceKind::Bucket).next().unwrap();
    match &bucket.args {
        ResourceArgs::Bucket(args) => {
            assert_eq!(args.labels.get("purpose"), Some("model-storage"));
            assert_eq!(args.labels.get("team"), Some("ml"));
            assert!(args.force_destroy && args.versioning && args.uniform_bucket_level_access);
        }
        other => panic!("unexpected args {other:?}"),
    }
    assert!(!plan.get("test-vertex-batch-vertex-model-bucket").unwrap().retain_on_delete);
}
