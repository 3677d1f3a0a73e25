//! Export job processing: PENDING -> PROCESSING -> COMPLETED or FAILED.

use skt_core::entities::ExportJob;
use skt_core::enums::ExportStatus;

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::render::{self, ExportData, ExportRow};
use crate::repos::beneficiary::BeneficiaryScope;
use crate::repos::export::ExportCompletion;
use crate::service::SktService;

/// Relative directory recorded in `file_path`.
const EXPORTS_PREFIX: &str = "exports";

impl SktService {
    /// Render a pending export and record where it went.
    pub async fn process_export_job(&self, job_id: &str) {
        let job = match self.get_export_job(job_id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job = job_id, error = %e, "export job not loadable");
                return;
            }
        };

        if let Err(e) = self
            .transition_export_job(&job, ExportStatus::Processing, ExportCompletion::default())
            .await
        {
            tracing::error!(job = job_id, error = %e, "export job not startable");
            return;
        }
        let job = ExportJob {
            status: ExportStatus::Processing,
            ..job
        };

        let result = match self.render_export(&job).await {
            Ok(file_path) => self
                .transition_export_job(
                    &job,
                    ExportStatus::Completed,
                    ExportCompletion {
                        completed_at: Some(now()),
                        file_path: Some(&file_path),
                        error_message: None,
                    },
                )
                .await
                .map(|()| file_path),
            Err(e) => Err(e),
        };

        match result {
            Ok(file_path) => {
                tracing::info!(job = job_id, format = %job.format, file = %file_path, "export completed");
            }
            Err(e) => {
                tracing::error!(job = job_id, format = %job.format, error = %e, "export failed");
                let message = e.to_string();
                if let Err(e) = self
                    .transition_export_job(
                        &job,
                        ExportStatus::Failed,
                        ExportCompletion {
                            error_message: Some(&message),
                            ..ExportCompletion::default()
                        },
                    )
                    .await
                {
                    tracing::error!(job = job_id, error = %e, "could not mark export failed");
                }
            }
        }
    }

    /// Gather, render, and optionally write the export. Returns the
    /// relative `exports/<name>` path.
    async fn render_export(&self, job: &ExportJob) -> Result<String, DatabaseError> {
        let programme = self.get_programme(&job.programme_id).await?;
        let targets = self.list_targets(&job.programme_id).await?;
        let scope = BeneficiaryScope {
            status: job.filters.status,
            district: job.filters.district.clone(),
            institution: job.filters.institution.clone(),
        };

        let mut rows = Vec::new();
        for beneficiary in self.programme_beneficiaries(&job.programme_id, &scope).await? {
            let progress = self.get_progress(&beneficiary.id).await?;
            let placement = self.latest_placement(&beneficiary.id).await?;
            rows.push(ExportRow {
                beneficiary,
                progress,
                placement,
            });
        }

        let data = ExportData {
            programme,
            targets,
            rows,
            include_pii: job.include_pii,
            generated_at: now(),
        };
        let rendered =
            render::render(job.format, &data).map_err(|e| DatabaseError::Other(e.into()))?;

        if let Some(dir) = self.export_dir() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| DatabaseError::Other(e.into()))?;
            let path = dir.join(&rendered.file_name);
            tokio::fs::write(&path, &rendered.content)
                .await
                .map_err(|e| DatabaseError::Other(e.into()))?;
            tracing::debug!(path = %path.display(), bytes = rendered.content.len(), "export written");
        }

        Ok(format!("{EXPORTS_PREFIX}/{}", rendered.file_name))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::jobs::spawn_export_job;
    use crate::test_support::helpers::{create_test_programme, enrol, manager, test_service};
    use pretty_assertions::assert_eq;
    use skt_core::entities::ExportFilters;
    use skt_core::enums::{BeneficiaryStatus, ExportDestination, ExportFormat, ExportSchedule};
    use skt_core::validation::NewExportJob;

    fn request(format: ExportFormat, filters: ExportFilters) -> NewExportJob {
        NewExportJob {
            format,
            destination: ExportDestination::Api,
            filters,
            include_pii: false,
            schedule: ExportSchedule::Now,
            requested_by: "mgr-1".into(),
        }
    }

    #[tokio::test]
    async fn csv_export_completes() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        enrol(&svc, &programme.id, "L1").await;
        let job = svc
            .create_export_job(
                &programme.id,
                request(ExportFormat::Csv, ExportFilters::default()),
                &manager(),
            )
            .await
            .unwrap();

        svc.process_export_job(&job.id).await;

        let done = svc.get_export_job(&job.id).await.unwrap();
        assert_eq!(done.status, ExportStatus::Completed);
        assert!(done.completed_at.is_some());
        let path = done.file_path.unwrap();
        assert!(path.starts_with("exports/export_PSD25_"), "{path}");
        assert!(path.ends_with(".csv"));
    }

    #[tokio::test]
    async fn unsupported_format_fails() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let job = svc
            .create_export_job(
                &programme.id,
                request(ExportFormat::Pdf, ExportFilters::default()),
                &manager(),
            )
            .await
            .unwrap();

        svc.process_export_job(&job.id).await;

        let failed = svc.get_export_job(&job.id).await.unwrap();
        assert_eq!(failed.status, ExportStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("Unsupported export format"));
        assert_eq!(failed.file_path, None);
    }

    #[tokio::test]
    async fn writes_filtered_export_to_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let svc = test_service()
            .await
            .with_export_dir(Some(dir.path().join("out")));
        let programme = create_test_programme(&svc, "PSD25").await;
        enrol(&svc, &programme.id, "L1").await;
        let certified = enrol(&svc, &programme.id, "L2").await;
        svc.update_beneficiary_status(&certified.id, BeneficiaryStatus::Certified, &manager())
            .await
            .unwrap();

        let filters = ExportFilters {
            status: Some(BeneficiaryStatus::Certified),
            ..ExportFilters::default()
        };
        let job = svc
            .create_export_job(&programme.id, request(ExportFormat::Nsdc, filters), &manager())
            .await
            .unwrap();
        svc.process_export_job(&job.id).await;

        let done = svc.get_export_job(&job.id).await.unwrap();
        let file_path = done.file_path.unwrap();
        let name = file_path.trim_start_matches("exports/");
        let written = std::fs::read(dir.path().join("out").join(name)).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(doc["beneficiaries"].as_array().map(Vec::len), Some(1));
        assert_eq!(doc["beneficiaries"][0]["beneficiary_id"], certified.id.as_str());
    }

    #[tokio::test]
    async fn slash_in_code_stays_inside_export_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let svc = test_service().await.with_export_dir(Some(dir.path().to_path_buf()));
        let programme = create_test_programme(&svc, "PSD/25").await;
        let job = svc
            .create_export_job(
                &programme.id,
                request(ExportFormat::Csv, ExportFilters::default()),
                &manager(),
            )
            .await
            .unwrap();
        svc.process_export_job(&job.id).await;

        let done = svc.get_export_job(&job.id).await.unwrap();
        assert_eq!(done.status, ExportStatus::Completed, "{:?}", done.error_message);
        let file_path = done.file_path.unwrap();
        assert!(file_path.starts_with("exports/export_PSD_25_"), "{file_path}");
        let name = file_path.trim_start_matches("exports/");
        assert!(dir.path().join(name).is_file());
    }

    #[tokio::test]
    async fn completed_job_is_not_reprocessed() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let job = svc
            .create_export_job(
                &programme.id,
                request(ExportFormat::Pmkvy, ExportFilters::default()),
                &manager(),
            )
            .await
            .unwrap();
        svc.process_export_job(&job.id).await;
        let first = svc.get_export_job(&job.id).await.unwrap();

        svc.process_export_job(&job.id).await;
        assert_eq!(svc.get_export_job(&job.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn spawned_job_completes() {
        let svc = Arc::new(test_service().await);
        let programme = create_test_programme(&svc, "PSD25").await;
        let job = svc
            .create_export_job(
                &programme.id,
                request(ExportFormat::Csv, ExportFilters::default()),
                &manager(),
            )
            .await
            .unwrap();

        spawn_export_job(Arc::clone(&svc), job.id.clone()).await.unwrap();

        let done = svc.get_export_job(&job.id).await.unwrap();
        assert_eq!(done.status, ExportStatus::Completed);
    }
}
