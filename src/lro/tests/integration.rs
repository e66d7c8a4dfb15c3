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

extern crate cloud_snippets_lro as lro;

#[cfg(test)]
mod fake_service;

#[cfg(test)]
mod test {
    use super::fake_service::*;
    use lro::classify::{Classifier, Disposition};
    use lro::config::PollingConfig;
    use lro::error::rpc::{Code, Status};
    use lro::notification::{Message, channel, wait_for_notification};
    use lro::polling_backoff_policy::FixedInterval;
    use lro::polling_error_policy::{Aip194Strict, AlwaysContinue, PollingErrorPolicyExt};
    use lro::{Poller, PollingOptions, PollingResult, TerminalStates};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    type TestResult = anyhow::Result<()>;

    fn options() -> PollingOptions {
        PollingOptions::new()
            .with_polling_error_policy(Aip194Strict.with_attempt_limit(30))
            .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(30)))
    }

    fn dlp_classifier() -> impl Classifier<FakeJob> {
        TerminalStates::new()
            .set_succeeded(["DONE"])
            .set_failed(["FAILED", "CANCELED"])
            .by_state(|job: &FakeJob| job.state.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_immediate_success() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "DONE", 100)].into(),
            poll: [].into(),
        });
        let start = {
            let service = service.clone();
            move || async move { service.create_job().await }
        };
        let query = {
            let service = service.clone();
            move |name| {
                let service = service.clone();
                async move { service.get_job(name).await }
            }
        };
        let response = lro::new_poller(options(), start, query, dlp_classifier())
            .until_done()
            .await?;
        assert_eq!(response.progress, 100);
        assert!(service.queried().is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_success() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [
                job("jobs/001", "RUNNING", 25),
                unavailable(),
                job("jobs/001", "RUNNING", 75),
                job("jobs/001", "DONE", 100),
            ]
            .into(),
        });
        let begin = Instant::now();
        let response = poller(&service, options()).until_done().await?;
        assert_eq!(response.state, "DONE");
        assert_eq!(response.progress, 100);
        assert_eq!(begin.elapsed(), Duration::from_secs(4 * 30));
        assert_eq!(service.queried(), vec!["jobs/001"; 4]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_failed() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [
                job("jobs/001", "RUNNING", 25),
                job("jobs/001", "CANCELED", 25),
            ]
            .into(),
        });
        let error = poller(&service, options())
            .until_done()
            .await
            .expect_err("canceled jobs should fail");
        assert!(error.is_operation_failure(), "{error:?}");
        assert!(
            error.status().is_some_and(|s| s.message.contains("CANCELED")),
            "{error:?}"
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_permanent_error() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [unavailable(), not_found(), job("jobs/001", "DONE", 100)].into(),
        });
        let error = poller(&service, options())
            .until_done()
            .await
            .expect_err("NOT_FOUND is a permanent error");
        assert!(
            error.status().is_some_and(|s| s.code == Code::NotFound),
            "{error:?}"
        );
        assert_eq!(service.queried().len(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_always_continue() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [not_found(), not_found(), job("jobs/001", "DONE", 100)].into(),
        });
        let options =
            options().with_polling_error_policy(AlwaysContinue.with_attempt_limit(30));
        let response = poller(&service, options).until_done().await?;
        assert_eq!(response.state, "DONE");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_exhausted() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: std::iter::repeat_with(|| job("jobs/001", "RUNNING", 50))
                .take(40)
                .collect(),
        });
        let begin = Instant::now();
        let error = poller(&service, options())
            .until_done()
            .await
            .expect_err("the attempt limit should stop the loop");
        assert!(error.is_exhausted(), "{error:?}");
        assert!(error.to_string().contains("jobs/001"), "{error}");
        assert_eq!(service.queried().len(), 30);
        assert_eq!(begin.elapsed(), Duration::from_secs(30 * 30));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_deadline() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: std::iter::repeat_with(|| job("jobs/001", "RUNNING", 50))
                .take(40)
                .collect(),
        });
        let options = options().with_deadline(Duration::from_secs(100));
        let begin = Instant::now();
        let error = poller(&service, options)
            .until_done()
            .await
            .expect_err("the deadline should stop the loop");
        assert!(error.is_timeout(), "{error:?}");
        assert_eq!(begin.elapsed(), Duration::from_secs(100));
        assert_eq!(service.queried().len(), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn until_done_cancelled() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: std::iter::repeat_with(|| job("jobs/001", "RUNNING", 50))
                .take(40)
                .collect(),
        });
        let token = CancellationToken::new();
        let options = options().with_cancellation_token(token.clone());
        let handle = tokio::spawn(async move { poller(&service, options).until_done().await });
        tokio::time::sleep(Duration::from_secs(45)).await;
        token.cancel();
        let error = handle.await?.expect_err("cancelled loops return an error");
        assert!(error.is_cancelled(), "{error:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn poll_manual_loop() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [
                job("jobs/001", "RUNNING", 50),
                unavailable(),
                job("jobs/001", "DONE", 100),
            ]
            .into(),
        });
        let mut poller = poller(&service, options());
        let mut progress = Vec::new();
        let mut errors = 0;
        while let Some(p) = poller.poll().await {
            match p {
                PollingResult::InProgress(j) => progress.push(j.progress),
                PollingResult::PollingError(_) => errors += 1,
                PollingResult::Completed(r) => {
                    assert_eq!(r?.progress, 100);
                }
            }
        }
        assert_eq!(progress, vec![0, 50]);
        assert_eq!(errors, 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn into_stream() -> TestResult {
        use futures::StreamExt;
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [job("jobs/001", "RUNNING", 50), job("jobs/001", "DONE", 100)].into(),
        });
        let results = poller(&service, options())
            .into_stream()
            .collect::<Vec<_>>()
            .await;
        assert_eq!(results.len(), 3, "{results:?}");
        assert!(
            matches!(results.last(), Some(PollingResult::Completed(Ok(j))) if j.state == "DONE"),
            "{results:?}"
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn resume_from_config() -> TestResult {
        let config = PollingConfig::from_json(
            r#"{
                "attempt_limit": 5,
                "backoff": {"kind": "fixed", "interval": "10s"},
                "succeeded_states": ["SUCCEEDED"],
                "failed_states": ["FAILED"]
            }"#,
        )?;
        let service = FakeService::new(ServerState {
            create: [].into(),
            poll: [
                job("jobs/007", "RUNNING", 50),
                job("jobs/007", "SUCCEEDED", 100),
            ]
            .into(),
        });
        let classifier = config
            .terminal_states()
            .by_state(|job: &FakeJob| job.state.clone());
        let query = move |name| {
            let service = service.clone();
            async move { service.get_job(name).await }
        };
        let begin = Instant::now();
        let response = lro::resume_poller(config.to_options()?, "jobs/007", query, classifier)
            .until_done()
            .await?;
        assert_eq!(response.state, "SUCCEEDED");
        assert_eq!(begin.elapsed(), Duration::from_secs(10));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn custom_classifier_with_details() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [job("jobs/001", "PENDING", 0)].into(),
            poll: [job("jobs/001", "DONE", -1)].into(),
        });
        // A job can be DONE and still report an error.
        let classifier = |job: &FakeJob| match job.state.as_str() {
            "DONE" if job.progress < 0 => Disposition::Failed(
                Status::default()
                    .set_code(Code::Internal)
                    .set_message("job completed with errors")
                    .set_details([serde_json::json!({"progress": job.progress})]),
            ),
            "DONE" => Disposition::Succeeded,
            _ => Disposition::InProgress,
        };
        let error = lro::new_poller(
            options(),
            {
                let service = service.clone();
                move || async move { service.create_job().await }
            },
            move |name| {
                let service = service.clone();
                async move { service.get_job(name).await }
            },
            classifier,
        )
        .until_done()
        .await
        .expect_err("the classifier reports a failure");
        let status = error.status().expect("operation failures have a status");
        assert_eq!(status.code, Code::Internal);
        assert_eq!(status.details, vec![serde_json::json!({"progress": -1})]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn notification_then_fetch() -> TestResult {
        let service = FakeService::new(ServerState {
            create: [].into(),
            poll: [job("projects/p/dlpJobs/r-1", "DONE", 100)].into(),
        });
        let (publisher, mut subscription) = channel();
        let options = PollingOptions::new().with_deadline(Duration::from_secs(600));
        let notifier = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            publisher.publish(
                Message::new()
                    .set_id("1")
                    .set_attributes([("DlpJobName", "projects/p/dlpJobs/other")]),
            )?;
            tokio::time::sleep(Duration::from_secs(60)).await;
            publisher.publish(
                Message::new()
                    .set_id("2")
                    .set_attributes([("DlpJobName", "projects/p/dlpJobs/r-1")]),
            )?;
            lro::Result::Ok(())
        });
        let message = wait_for_notification(
            &mut subscription,
            "DlpJobName",
            "projects/p/dlpJobs/r-1",
            &options,
        )
        .await?;
        assert_eq!(message.id, "2");
        assert_eq!(subscription.nacked(), ["1"]);
        notifier.await??;

        let job = service.get_job("projects/p/dlpJobs/r-1".to_string()).await?;
        assert_eq!(job.state, "DONE");
        Ok(())
    }

    fn poller(service: &FakeService, options: PollingOptions) -> impl Poller<FakeJob> {
        let start = {
            let service = service.clone();
            move || async move { service.create_job().await }
        };
        let query = {
            let service = service.clone();
            move |name| {
                let service = service.clone();
                async move { service.get_job(name).await }
            }
        };
        lro::new_poller(options, start, query, dlp_classifier())
    }
}
