// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod fake;

#[cfg(test)]
mod tests {
    use super::fake;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use lro::error::rpc::Code;
    use serde_json::json;

    const BATCH_JOB: &str = "projects/p/locations/us-central1/jobs/j1";
    const PREDICTION_JOB: &str = "projects/p/locations/us-central1/batchPredictionJobs/123";

    #[tokio::test]
    async fn batch_job_with_runnable_labels() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/projects/p/locations/us-central1/jobs"),
                request::query(url_decoded(contains(("jobId", "j1")))),
            ])
            .respond_with(json_encoded(json!({
                "name": BATCH_JOB,
                "status": {"state": "QUEUED"},
            }))),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", format!("/v1/{BATCH_JOB}")))
                .times(3)
                .respond_with(cycle(vec![
                    fake::ok(json!({"name": BATCH_JOB, "status": {"state": "SCHEDULED"}})),
                    fake::ok(json!({"name": BATCH_JOB, "status": {"state": "RUNNING"}})),
                    fake::ok(json!({
                        "name": BATCH_JOB,
                        "status": {"state": "SUCCEEDED", "runDuration": "12.5s"},
                    })),
                ])),
        );

        let client = fake::client(&server)?;
        let job = cloud_snippets_samples::batch::create_job_with_runnable_labels(
            &client,
            "p",
            "us-central1",
            "j1",
            fake::options(10),
        )
        .await?;
        assert_eq!(job.status.state, "SUCCEEDED");
        assert_eq!(job.status.run_duration.as_deref(), Some("12.5s"));
        Ok(())
    }

    #[tokio::test]
    async fn batch_job_create_error() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/v1/projects/p/locations/us-central1/jobs",
            ))
            .respond_with(fake::not_found()),
        );

        let client = fake::client(&server)?;
        let err = cloud_snippets_samples::batch::create_job_with_runnable_labels(
            &client,
            "p",
            "us-central1",
            "j1",
            fake::options(10),
        )
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        let err = err
            .downcast::<lro::Error>()
            .map_err(|e| anyhow::anyhow!("expected an lro::Error, got={e:?}"))?;
        assert_eq!(err.status().map(|s| s.code), Some(Code::NotFound), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn get_batch_prediction_job() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", format!("/v1/{PREDICTION_JOB}")))
                .respond_with(json_encoded(json!({
                    "name": PREDICTION_JOB,
                    "displayName": "nightly",
                    "state": "JOB_STATE_RUNNING",
                    "labels": {"team": "ml"},
                }))),
        );

        let client = fake::client(&server)?;
        let job = cloud_snippets_samples::batch_prediction::get_batch_prediction_job(
            &client,
            "p",
            "us-central1",
            "123",
        )
        .await?;
        assert_eq!(job.display_name, "nightly");
        assert_eq!(job.state, "JOB_STATE_RUNNING");
        assert_eq!(job.labels.get("team").map(String::as_str), Some("ml"));
        Ok(())
    }

    #[tokio::test]
    async fn wait_batch_prediction_job() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", format!("/v1/{PREDICTION_JOB}")))
                .times(3)
                .respond_with(cycle(vec![
                    fake::ok(json!({"name": PREDICTION_JOB, "state": "JOB_STATE_PENDING"})),
                    fake::unavailable(),
                    fake::ok(json!({"name": PREDICTION_JOB, "state": "JOB_STATE_PARTIALLY_SUCCEEDED"})),
                ])),
        );

        let client = fake::client(&server)?;
        let job = cloud_snippets_samples::batch_prediction::wait_batch_prediction_job(
            &client,
            "p",
            "us-central1",
            "123",
            fake::options(10),
        )
        .await?;
        assert_eq!(job.state, "JOB_STATE_PARTIALLY_SUCCEEDED");
        Ok(())
    }

    #[tokio::test]
    async fn wait_batch_prediction_job_failed() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", format!("/v1/{PREDICTION_JOB}")))
                .respond_with(json_encoded(json!({
                    "name": PREDICTION_JOB,
                    "state": "JOB_STATE_FAILED",
                    "error": {"code": 3, "message": "bad input format"},
                }))),
        );

        let client = fake::client(&server)?;
        let err = cloud_snippets_samples::batch_prediction::wait_batch_prediction_job(
            &client,
            "p",
            "us-central1",
            "123",
            fake::options(10),
        )
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        let err = err
            .downcast::<lro::Error>()
            .map_err(|e| anyhow::anyhow!("expected an lro::Error, got={e:?}"))?;
        assert!(err.is_operation_failure(), "{err:?}");
        let status = err.status().cloned().unwrap_or_default();
        assert_eq!(status.code, Code::InvalidArgument);
        assert_eq!(status.message, "bad input format");
        Ok(())
    }
}
