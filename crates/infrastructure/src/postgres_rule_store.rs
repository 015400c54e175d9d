use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use vigil_application::{PolicyQuery, RuleStore};
use vigil_core::{AppError, AppResult};
use vigil_domain::{GroupRule, PolicyEffect, PolicyRule, Rule, RuleRecord};

/// PostgreSQL-backed store for policy and group rules.
#[derive(Clone)]
pub struct PostgresRuleStore {
    pool: PgPool,
}

impl PostgresRuleStore {
    /// Creates a rule store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RuleRow {
    ptype: String,
    v0: String,
    v1: String,
    v2: String,
    v3: String,
    v4: String,
    v5: String,
}

impl From<RuleRow> for RuleRecord {
    fn from(row: RuleRow) -> Self {
        Self {
            ptype: row.ptype,
            v0: row.v0,
            v1: row.v1,
            v2: row.v2,
            v3: row.v3,
            v4: row.v4,
            v5: row.v5,
        }
    }
}

#[async_trait]
impl RuleStore for PostgresRuleStore {
    async fn replace_policy_rules(&self, subject: &str, rules: &[PolicyRule]) -> AppResult<()> {
        if let Some(rule) = rules.iter().find(|rule| rule.subject != subject) {
            return Err(AppError::Validation(format!(
                "policy rule subject '{}' does not match '{subject}'",
                rule.subject
            )));
        }

        let records = rules.iter().map(RuleRecord::from).collect::<Vec<_>>();
        let domains = records
            .iter()
            .map(|record| record.v1.clone())
            .collect::<Vec<_>>();
        let objects = records
            .iter()
            .map(|record| record.v2.clone())
            .collect::<Vec<_>>();
        let actions = records
            .iter()
            .map(|record| record.v3.clone())
            .collect::<Vec<_>>();
        let effects = records
            .iter()
            .map(|record| record.v4.clone())
            .collect::<Vec<_>>();

        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(subject)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to lock policy subject '{subject}': {error}"))
            })?;

        let removed = sqlx::query(
            r#"
            DELETE FROM authz_rules
            WHERE ptype = 'p' AND v0 = $1
            "#,
        )
        .bind(subject)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear policy rules: {error}")))?
        .rows_affected();

        if !records.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO authz_rules (ptype, v0, v1, v2, v3, v4)
                SELECT 'p', $1, domain, object, action, effect
                FROM UNNEST($2::text[], $3::text[], $4::text[], $5::text[])
                    AS incoming(domain, object, action, effect)
                "#,
            )
            .bind(subject)
            .bind(&domains)
            .bind(&objects)
            .bind(&actions)
            .bind(&effects)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to insert policy rules: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(
            subject,
            removed,
            inserted = records.len(),
            "replaced policy rules"
        );

        Ok(())
    }

    async fn list_policy_rules(&self, subject: &str) -> AppResult<Vec<PolicyRule>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            r#"
            SELECT ptype, v0, v1, v2, v3, v4, v5
            FROM authz_rules
            WHERE ptype = 'p' AND v0 = $1
            ORDER BY v1, v2, v3, v4
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list policy rules: {error}")))?;

        rows.into_iter().map(decode_policy_rule).collect()
    }

    async fn matching_policy_effects(&self, query: &PolicyQuery) -> AppResult<Vec<PolicyEffect>> {
        let effects = sqlx::query_scalar::<_, String>(
            r#"
            SELECT v4
            FROM authz_rules
            WHERE ptype = 'p'
                AND v0 = ANY($1)
                AND v1 = ANY($2)
                AND v2 = ANY($3)
                AND v3 = $4
            "#,
        )
        .bind(&query.subjects)
        .bind(&query.domains)
        .bind(&query.objects)
        .bind(query.action.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load matching policy rules: {error}"))
        })?;

        effects
            .iter()
            .map(|effect| PolicyEffect::from_str(effect.as_str()))
            .collect()
    }

    async fn add_group_rule(&self, rule: &GroupRule) -> AppResult<bool> {
        let record = RuleRecord::from(rule);
        let inserted = sqlx::query(
            r#"
            INSERT INTO authz_rules (ptype, v0, v1, v2)
            VALUES ('g', $1, $2, $3)
            ON CONFLICT (v0, v1, v2) WHERE ptype = 'g' DO NOTHING
            "#,
        )
        .bind(record.v0.as_str())
        .bind(record.v1.as_str())
        .bind(record.v2.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to add group rule: {error}")))?
        .rows_affected();

        Ok(inserted > 0)
    }

    async fn remove_group_rule(&self, rule: &GroupRule) -> AppResult<bool> {
        let record = RuleRecord::from(rule);
        let removed = sqlx::query(
            r#"
            DELETE FROM authz_rules
            WHERE ptype = 'g' AND v0 = $1 AND v1 = $2 AND v2 = $3
            "#,
        )
        .bind(record.v0.as_str())
        .bind(record.v1.as_str())
        .bind(record.v2.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove group rule: {error}")))?
        .rows_affected();

        Ok(removed > 0)
    }

    async fn remove_group_rules_for_role(&self, role: &str) -> AppResult<u64> {
        let removed = sqlx::query(
            r#"
            DELETE FROM authz_rules
            WHERE ptype = 'g' AND v1 = $1
            "#,
        )
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove group rules of role '{role}': {error}"))
        })?
        .rows_affected();

        Ok(removed)
    }

    async fn list_group_rules_for_user(&self, user: &str) -> AppResult<Vec<GroupRule>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            r#"
            SELECT ptype, v0, v1, v2, v3, v4, v5
            FROM authz_rules
            WHERE ptype = 'g' AND v0 = $1
            ORDER BY v1, v2
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list group rules: {error}")))?;

        rows.into_iter()
            .map(|row| match Rule::try_from(RuleRecord::from(row))? {
                Rule::Group(rule) => Ok(rule),
                Rule::Policy(_) => Err(AppError::Internal(
                    "group rule query returned a policy row".to_owned(),
                )),
            })
            .collect()
    }
}

fn decode_policy_rule(row: RuleRow) -> AppResult<PolicyRule> {
    match Rule::try_from(RuleRecord::from(row))? {
        Rule::Policy(rule) => Ok(rule),
        Rule::Group(_) => Err(AppError::Internal(
            "policy rule query returned a group row".to_owned(),
        )),
    }
}
