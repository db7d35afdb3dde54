// src/service/transfer_service.rs
//! CSV export and bulk import of members.
use std::collections::HashMap;

use csv::{ByteRecord, ReaderBuilder, StringRecord, Writer};
use gym_share::parse_flexible_date;
use tracing::{error, info};

use crate::db::{Db, MemberRepository, PlanRepository};
use crate::dto::ImportSummary;
use crate::error::{AppError, Result};
use crate::model::{NewMember, Plan, TenantContext};

pub const EXPORT_HEADER: [&str; 8] = [
    "id",
    "name",
    "email",
    "phone",
    "planName",
    "startDate",
    "endDate",
    "planId",
];

const REQUIRED_COLUMNS: [&str; 5] = ["name", "phone", "planid", "startdate", "enddate"];

/// 表头列名（小写）到列下标的映射
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self> {
        let names: Vec<String> = header
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !names.iter().any(|n| n == c))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::invalid(format!(
                "Missing required columns: {}. Present: {}",
                missing.join(", "),
                names.join(", ")
            )));
        }

        let mut index = HashMap::new();
        for (i, name) in names.into_iter().enumerate() {
            index.entry(name).or_insert(i);
        }
        Ok(Self { index })
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
    }
}

/// Cells of one data row after the required-field checks.
struct ImportRow {
    name: String,
    email: Option<String>,
    phone: String,
    plan_id: u64,
    start_date: chrono::NaiveDate,
    end_date: chrono::NaiveDate,
}

fn non_empty(value: Option<&str>, reason: &str) -> std::result::Result<String, String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(reason.to_string()),
    }
}

impl ImportRow {
    fn parse(columns: &Columns, record: &StringRecord) -> std::result::Result<Self, String> {
        let name = non_empty(columns.cell(record, "name"), "Name is required")?;
        let phone = non_empty(columns.cell(record, "phone"), "Phone is required")?;
        let plan_id = non_empty(columns.cell(record, "planid"), "planId is required")?;
        let start_date = non_empty(columns.cell(record, "startdate"), "startDate is required")?;
        let end_date = non_empty(columns.cell(record, "enddate"), "endDate is required")?;

        let plan_id = plan_id
            .parse::<u64>()
            .map_err(|_| format!("Invalid planId: '{}'", plan_id))?;
        let start_date = parse_flexible_date(&start_date).map_err(|e| e.to_string())?;
        let end_date = parse_flexible_date(&end_date).map_err(|e| e.to_string())?;

        Ok(Self {
            name,
            email: columns
                .cell(record, "email")
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            phone,
            plan_id,
            start_date,
            end_date,
        })
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

pub struct TransferService {
    repo: Db,
}

impl TransferService {
    pub fn new(repo: Db) -> Self {
        Self { repo }
    }

    /// 导出当前租户全部会员，按 id 升序
    pub async fn export_csv(&self, ctx: &TenantContext) -> Result<Vec<u8>> {
        let members = self.repo.list_members(ctx.tenant_id).await?;

        let mut plan_ids: Vec<u64> = members.iter().map(|m| m.plan_id).collect();
        plan_ids.sort_unstable();
        plan_ids.dedup();
        let plans: HashMap<u64, Plan> = self
            .repo
            .find_plans(ctx.tenant_id, &plan_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let write_failed = |e: csv::Error| {
            error!(error = %e, "写入 CSV 失败");
            AppError::internal(format!("Error while exporting: {}", e))
        };

        let mut writer = Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADER).map_err(write_failed)?;
        for m in &members {
            let plan_name = plans.get(&m.plan_id).map(|p| p.plan_name.as_str()).unwrap_or("");
            writer
                .write_record([
                    m.id.to_string().as_str(),
                    m.name.as_str(),
                    m.email.as_deref().unwrap_or(""),
                    m.phone.as_str(),
                    plan_name,
                    m.start_date.to_string().as_str(),
                    m.end_date.to_string().as_str(),
                    m.plan_id.to_string().as_str(),
                ])
                .map_err(write_failed)?;
        }

        let bytes = writer.into_inner().map_err(|e| {
            error!(error = %e, "写入 CSV 失败");
            AppError::internal(format!("Error while exporting: {}", e))
        })?;
        info!(tenant_id = ctx.tenant_id, count = members.len(), "会员已导出");
        Ok(bytes)
    }

    /// Imports rows one by one. Row failures are collected in the summary;
    /// only a missing or malformed header, or an unreadable file, fails the
    /// whole import.
    ///
    /// Cells are decoded lossily, so a row in a legacy encoding still imports
    /// with U+FFFD in place of the bad bytes. Row N is the N-th CSV record,
    /// header included; a quoted cell spanning lines is still one row.
    pub async fn import_csv(&self, ctx: &TenantContext, data: &[u8]) -> Result<ImportSummary> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let read_failed = |e: csv::Error| {
            error!(error = %e, "读取 CSV 失败");
            AppError::internal(format!("Error while importing: {}", e))
        };

        let mut raw = ByteRecord::new();
        if !reader.read_byte_record(&mut raw).map_err(read_failed)? {
            return Err(AppError::invalid("Empty file"));
        }
        let columns = Columns::from_header(&StringRecord::from_byte_record_lossy(raw.clone()))?;

        let mut summary = ImportSummary::default();
        let mut row_number: u64 = 1;
        while reader.read_byte_record(&mut raw).map_err(read_failed)? {
            row_number += 1;
            let record = StringRecord::from_byte_record_lossy(raw.clone());
            if is_blank(&record) {
                continue;
            }

            match self.import_row(ctx, &columns, &record).await {
                Ok(()) => summary.success_count += 1,
                Err(reason) => {
                    summary.failure_count += 1;
                    let context = columns
                        .cell(&record, "name")
                        .map(|name| format!(" (Name: {})", name))
                        .unwrap_or_default();
                    summary
                        .errors
                        .push(format!("Row {}{}: {}", row_number, context, reason));
                }
            }
        }

        info!(
            tenant_id = ctx.tenant_id,
            success = summary.success_count,
            failed = summary.failure_count,
            "会员导入完成"
        );
        Ok(summary)
    }

    async fn import_row(
        &self,
        ctx: &TenantContext,
        columns: &Columns,
        record: &StringRecord,
    ) -> std::result::Result<(), String> {
        let row = ImportRow::parse(columns, record)?;

        let plan = self
            .repo
            .find_plan(ctx.tenant_id, row.plan_id)
            .await
            .map_err(|e| e.message)?
            .ok_or_else(|| format!("Plan not found for ID: {}", row.plan_id))?;

        self.repo
            .insert_member(NewMember {
                tenant_id: ctx.tenant_id,
                plan_id: plan.id,
                name: row.name,
                email: row.email,
                phone: row.phone,
                start_date: row.start_date,
                end_date: row.end_date,
            })
            .await
            .map_err(|e| e.message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{date, memory_db, seed_plan, seed_tenant};

    #[tokio::test]
    async fn import_reports_rows_with_foreign_plans() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let plan = seed_plan(&db, &ctx, "Monthly", 1).await;
        let svc = TransferService::new(db.clone());

        let csv = format!(
            "name,phone,planid,startdate,enddate\nAlice,555-1,{},2025-01-01,2025-07-01\nBob,555-2,999,2025-01-01,2025-07-01\n",
            plan.id
        );
        let summary = svc.import_csv(&ctx, csv.as_bytes()).await.unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.errors, vec!["Row 3 (Name: Bob): Plan not found for ID: 999".to_string()]);

        let members = db.list_members(ctx.tenant_id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Alice");
        assert_eq!(members[0].end_date, date(2025, 7, 1));
    }

    #[tokio::test]
    async fn import_matches_headers_case_insensitively_and_skips_blank_rows() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let plan = seed_plan(&db, &ctx, "Monthly", 1).await;
        let svc = TransferService::new(db.clone());

        let csv = format!(
            "\u{feff}Name, Phone ,PlanId,StartDate,EndDate,Email\n , , , , ,\n Carol ,555-3,{id},15/03/2025,3/4/2025,\n,555-4,{id},2025-01-01,2025-02-01,x@y.z\n",
            id = plan.id
        );
        let summary = svc.import_csv(&ctx, csv.as_bytes()).await.unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.errors, vec!["Row 4 (Name: ): Name is required".to_string()]);

        let members = db.list_members(ctx.tenant_id).await.unwrap();
        assert_eq!(members[0].name, "Carol");
        assert_eq!(members[0].email, None);
        assert_eq!(members[0].start_date, date(2025, 3, 15));
        assert_eq!(members[0].end_date, date(2025, 4, 3));
    }

    #[tokio::test]
    async fn import_row_reasons_are_specific() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let plan = seed_plan(&db, &ctx, "Monthly", 1).await;
        let svc = TransferService::new(db.clone());

        let csv = format!(
            "name,phone,planid,startdate,enddate\n\
             A,,{id},2025-01-01,2025-02-01\n\
             B,1,,2025-01-01,2025-02-01\n\
             C,1,{id},,2025-02-01\n\
             D,1,{id},2025-01-01,\n\
             E,1,abc,2025-01-01,2025-02-01\n\
             F,1,{id},2025/13/45,2025-02-01\n",
            id = plan.id
        );
        let summary = svc.import_csv(&ctx, csv.as_bytes()).await.unwrap();

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failure_count, 6);
        assert_eq!(summary.errors[0], "Row 2 (Name: A): Phone is required");
        assert_eq!(summary.errors[1], "Row 3 (Name: B): planId is required");
        assert_eq!(summary.errors[2], "Row 4 (Name: C): startDate is required");
        assert_eq!(summary.errors[3], "Row 5 (Name: D): endDate is required");
        assert_eq!(summary.errors[4], "Row 6 (Name: E): Invalid planId: 'abc'");
        assert!(summary.errors[5].starts_with("Row 7 (Name: F): Invalid date format: '2025/13/45'"));
    }

    #[tokio::test]
    async fn import_keeps_going_past_non_utf8_cells() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let plan = seed_plan(&db, &ctx, "Monthly", 1).await;
        let svc = TransferService::new(db.clone());

        let mut csv = b"name,phone,planid,startdate,enddate\n".to_vec();
        for name in [&b"Alice"[..], &b"Jos\xe9"[..], &b"Carl"[..]] {
            csv.extend_from_slice(name);
            csv.extend_from_slice(format!(",555,{},2025-01-01,2025-02-01\n", plan.id).as_bytes());
        }
        let summary = svc.import_csv(&ctx, &csv).await.unwrap();

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failure_count, 0);
        let names: Vec<String> = db
            .list_members(ctx.tenant_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Jos\u{fffd}", "Carl"]);
    }

    #[tokio::test]
    async fn import_rows_count_records_not_lines() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let plan = seed_plan(&db, &ctx, "Monthly", 1).await;
        let svc = TransferService::new(db.clone());

        let csv = format!(
            "name,phone,planid,startdate,enddate\n\"Ann\nMarie\",555-1,{},2025-01-01,2025-02-01\nBob,555-2,999,2025-01-01,2025-02-01\n",
            plan.id
        );
        let summary = svc.import_csv(&ctx, csv.as_bytes()).await.unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.errors, vec!["Row 3 (Name: Bob): Plan not found for ID: 999".to_string()]);
        let members = db.list_members(ctx.tenant_id).await.unwrap();
        assert_eq!(members[0].name, "Ann\nMarie");
    }

    #[tokio::test]
    async fn import_rejects_empty_file_and_missing_columns() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let svc = TransferService::new(db.clone());

        let err = svc.import_csv(&ctx, b"").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.message, "Empty file");

        let err = svc
            .import_csv(&ctx, b"name,phone,planid\nAlice,1,1\n")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(
            err.message,
            "Missing required columns: startdate, enddate. Present: name, phone, planid"
        );
        assert!(db.list_members(ctx.tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_then_import_restores_members() {
        let db = memory_db();
        let ctx = seed_tenant(&db, "a@gym.test", "1").await;
        let plan = seed_plan(&db, &ctx, "Gold, Annual", 12).await;
        for (name, email) in [("Alice", Some("alice@example.com")), ("Bob \"Bobby\"", None)] {
            db.insert_member(NewMember {
                tenant_id: ctx.tenant_id,
                plan_id: plan.id,
                name: name.to_string(),
                email: email.map(str::to_string),
                phone: "555".to_string(),
                start_date: date(2025, 1, 1),
                end_date: date(2026, 1, 1),
            })
            .await
            .unwrap();
        }
        let svc = TransferService::new(db.clone());

        let exported = svc.export_csv(&ctx).await.unwrap();
        let text = String::from_utf8(exported.clone()).unwrap();
        assert!(text.starts_with("id,name,email,phone,planName,startDate,endDate,planId\n"));
        assert!(text.contains(&format!("\"Gold, Annual\",2025-01-01,2026-01-01,{}\n", plan.id)));

        let before = db.list_members(ctx.tenant_id).await.unwrap();
        let summary = svc.import_csv(&ctx, &exported).await.unwrap();
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count, 0);

        let after = db.list_members(ctx.tenant_id).await.unwrap();
        assert_eq!(after.len(), 4);
        for (source, copy) in before.iter().zip(&after[2..]) {
            assert_eq!(copy.name, source.name);
            assert_eq!(copy.email, source.email);
            assert_eq!(copy.phone, source.phone);
            assert_eq!(copy.plan_id, source.plan_id);
            assert_eq!(copy.start_date, source.start_date);
            assert_eq!(copy.end_date, source.end_date);
        }
    }
}
