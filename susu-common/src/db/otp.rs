use async_trait::async_trait;
use diesel::sql_types::Text;
use diesel::{dsl, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbAsyncPool};
use crate::models::otp_record::{NewOtpRecord, OtpRecord};
use crate::otp::{OtpPurpose, OtpRecordStore, Replacement};

use crate::schema::otp_records as otp_record_fields;
use crate::schema::otp_records::dsl::otp_records;

pub struct Dao {
    db_async_pool: DbAsyncPool,
}

impl Dao {
    pub fn new(db_async_pool: &DbAsyncPool) -> Self {
        Self {
            db_async_pool: db_async_pool.clone(),
        }
    }
}

#[async_trait]
impl OtpRecordStore for Dao {
    async fn replace_live_record(
        &self,
        new_record: &NewOtpRecord<'_>,
        cooldown_start: SystemTime,
    ) -> Result<Replacement, DaoError> {
        let mut db_connection = self.db_async_pool.get().await?;

        // Issues for the same pair queue up behind this lock until the transaction ends
        let lock_key = format!("otp:{}:{}", new_record.purpose, new_record.identifier);

        db_connection
            .build_transaction()
            .run::<_, DaoError, _>(|conn| {
                Box::pin(async move {
                    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                        .bind::<Text, _>(&lock_key)
                        .execute(conn)
                        .await?;

                    let last_issued_at = otp_records
                        .select(otp_record_fields::created_at)
                        .filter(otp_record_fields::identifier.eq(new_record.identifier))
                        .filter(otp_record_fields::purpose.eq(new_record.purpose))
                        .filter(otp_record_fields::created_at.gt(cooldown_start))
                        .order(otp_record_fields::created_at.desc())
                        .first::<SystemTime>(conn)
                        .await
                        .optional()?;

                    if let Some(last_issued_at) = last_issued_at {
                        return Ok(Replacement::CoolingDown { last_issued_at });
                    }

                    dsl::update(
                        otp_records
                            .filter(otp_record_fields::identifier.eq(new_record.identifier))
                            .filter(otp_record_fields::purpose.eq(new_record.purpose))
                            .filter(otp_record_fields::used.eq(false)),
                    )
                    .set(otp_record_fields::used.eq(true))
                    .execute(conn)
                    .await?;

                    dsl::insert_into(otp_records)
                        .values(new_record)
                        .execute(conn)
                        .await?;

                    Ok(Replacement::Issued)
                })
            })
            .await
    }

    async fn find_live_record(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        now: SystemTime,
    ) -> Result<Option<OtpRecord>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;

        Ok(otp_records
            .select(OtpRecord::as_select())
            .filter(otp_record_fields::identifier.eq(identifier))
            .filter(otp_record_fields::purpose.eq(purpose))
            .filter(otp_record_fields::used.eq(false))
            .filter(otp_record_fields::expires_at.gt(now))
            .order(otp_record_fields::created_at.desc())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn consume(&self, id: Uuid) -> Result<bool, DaoError> {
        let mut conn = self.db_async_pool.get().await?;

        let rows_affected = dsl::update(
            otp_records
                .find(id)
                .filter(otp_record_fields::used.eq(false)),
        )
        .set(otp_record_fields::used.eq(true))
        .execute(&mut conn)
        .await?;

        Ok(rows_affected == 1)
    }

    async fn claim_attempt(&self, id: Uuid) -> Result<Option<i32>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;

        Ok(dsl::update(
            otp_records
                .find(id)
                .filter(otp_record_fields::used.eq(false))
                .filter(otp_record_fields::attempts.lt(otp_record_fields::max_attempts)),
        )
        .set(otp_record_fields::attempts.eq(otp_record_fields::attempts + 1))
        .returning(otp_record_fields::attempts)
        .get_result::<i32>(&mut conn)
        .await
        .optional()?)
    }

    async fn delete_all_expired(&self, now: SystemTime) -> Result<usize, DaoError> {
        let mut conn = self.db_async_pool.get().await?;

        Ok(
            diesel::delete(otp_records.filter(otp_record_fields::expires_at.le(now)))
                .execute(&mut conn)
                .await?,
        )
    }
}
