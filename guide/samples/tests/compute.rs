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

    const PREFIX: &str = "/compute/v1/projects/p/zones/us-central1-a";

    #[tokio::test]
    async fn create_instance() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", format!("{PREFIX}/instances")),
                request::body(json_decoded(|b: &serde_json::Value| b["name"] == "vm-1")),
            ])
            .respond_with(json_encoded(json!({
                "name": "operation-123",
                "status": "PENDING",
                "targetLink": "projects/p/zones/us-central1-a/instances/vm-1",
            }))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                format!("{PREFIX}/operations/operation-123/wait"),
            ))
            .times(2)
            .respond_with(cycle(vec![
                fake::ok(json!({"name": "operation-123", "status": "RUNNING", "progress": 50})),
                fake::ok(json!({
                    "name": "operation-123",
                    "status": "DONE",
                    "progress": 100,
                    "targetLink": "projects/p/zones/us-central1-a/instances/vm-1",
                })),
            ])),
        );

        let client = fake::client(&server)?;
        let op = cloud_snippets_samples::compute::create_instance(
            &client,
            "p",
            "us-central1-a",
            "vm-1",
            fake::options(5),
        )
        .await?;
        assert_eq!(op.status, "DONE");
        assert_eq!(op.target_link, "projects/p/zones/us-central1-a/instances/vm-1");
        Ok(())
    }

    #[tokio::test]
    async fn create_instance_error() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", format!("{PREFIX}/instances")))
                .respond_with(json_encoded(json!({"name": "operation-123", "status": "RUNNING"}))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                format!("{PREFIX}/operations/operation-123/wait"),
            ))
            .respond_with(json_encoded(json!({
                "name": "operation-123",
                "status": "DONE",
                "httpErrorStatusCode": 403,
                "httpErrorMessage": "FORBIDDEN",
                "error": {"errors": [{"code": "QUOTA_EXCEEDED", "message": "quota exceeded"}]},
            }))),
        );

        let client = fake::client(&server)?;
        let err = cloud_snippets_samples::compute::create_instance(
            &client,
            "p",
            "us-central1-a",
            "vm-1",
            fake::options(5),
        )
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        let err = err
            .downcast::<lro::Error>()
            .map_err(|e| anyhow::anyhow!("expected an lro::Error, got={e:?}"))?;
        assert!(err.is_operation_failure(), "{err:?}");
        let status = err.status().cloned().unwrap_or_default();
        assert_eq!(status.code, Code::PermissionDenied);
        assert_eq!(status.message, "FORBIDDEN");
        Ok(())
    }
}
