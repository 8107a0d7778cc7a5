//! Local store access
//!
//! [`LocalStore`] is the narrow interface the connectors consume: streaming
//! selection of contacts and companies for a batch, primary-company lookup,
//! and load/save of single entities. [`SqliteStore`] implements it on the
//! shared SQLite database.

use crate::db::models::{CompanyLink, FieldDefinition, LocalCompany, LocalContact};
use crate::fields::FieldValue;
use crate::mapping::Concept;
use crate::time::{SyncSelection, SyncWindow};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Storage interface consumed by the sync engine
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Contacts with a non-empty email inside the selection, oldest id first
    ///
    /// The stream is lazy: rows are decoded as they are pulled.
    async fn contacts_for_sync<'a>(
        &'a self,
        selection: &SyncSelection,
    ) -> Result<BoxStream<'a, Result<LocalContact>>>;

    /// Companies inside the selection, oldest id first
    async fn companies_for_sync<'a>(
        &'a self,
        selection: &SyncSelection,
    ) -> Result<BoxStream<'a, Result<LocalCompany>>>;

    /// All company associations of a contact
    async fn companies_for_contact(&self, contact_id: i64) -> Result<Vec<CompanyLink>>;

    async fn load_contact(&self, id: i64) -> Result<LocalContact>;

    async fn load_company(&self, id: i64) -> Result<LocalCompany>;

    async fn save_contact(&self, contact: &LocalContact) -> Result<()>;

    async fn save_company(&self, company: &LocalCompany) -> Result<()>;

    /// The contact's primary company, if it has one
    async fn primary_company_for_contact(&self, contact_id: i64) -> Result<Option<LocalCompany>> {
        let links = self.companies_for_contact(contact_id).await?;
        match links.into_iter().find(|link| link.is_primary) {
            Some(link) => Ok(Some(self.load_company(link.company_id).await?)),
            None => Ok(None),
        }
    }
}

const CONTACT_COLUMNS: &str = "id, title, firstname, lastname, email, phone, mobile, position, \
     address1, address2, city, state, zipcode, country, points, date_added, fields";

const COMPANY_COLUMNS: &str = "id, name, email, phone, fax, address1, address2, city, state, \
     zipcode, country, website, description, date_added, fields";

// Window and limit are bound as parameters so the statement text stays static:
// first bind selects full sync, a negative LIMIT means unlimited.
const CONTACTS_FOR_SYNC: &str = r#"
    SELECT id, title, firstname, lastname, email, phone, mobile, position,
           address1, address2, city, state, zipcode, country, points, date_added, fields
    FROM contacts
    WHERE email IS NOT NULL AND email != ''
      AND (? = 1 OR (date_added >= ? AND date_added <= ?))
    ORDER BY id
    LIMIT ?
"#;

const COMPANIES_FOR_SYNC: &str = r#"
    SELECT id, name, email, phone, fax, address1, address2, city, state,
           zipcode, country, website, description, date_added, fields
    FROM companies
    WHERE (? = 1 OR (date_added >= ? AND date_added <= ?))
    ORDER BY id
    LIMIT ?
"#;

/// SQLite-backed [`LocalStore`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = crate::db::init::init_database(path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Declare a custom local field; existing declarations are kept
    pub async fn declare_field(&self, definition: &FieldDefinition) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO field_definitions (object, alias, label, field_type)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(definition.object.as_str())
        .bind(&definition.alias)
        .bind(&definition.label)
        .bind(&definition.field_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Aliases of custom fields declared for an object
    pub async fn declared_fields(&self, object: Concept) -> Result<Vec<String>> {
        let aliases = sqlx::query_scalar::<_, String>(
            "SELECT alias FROM field_definitions WHERE object = ? ORDER BY alias",
        )
        .bind(object.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(aliases)
    }

    /// Insert a new contact, assigning its id
    pub async fn insert_contact(&self, contact: &mut LocalContact) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO contacts (
                title, firstname, lastname, email, phone, mobile, position,
                address1, address2, city, state, zipcode, country, points,
                date_added, fields
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact.title)
        .bind(&contact.firstname)
        .bind(&contact.lastname)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.mobile)
        .bind(&contact.position)
        .bind(&contact.address1)
        .bind(&contact.address2)
        .bind(&contact.city)
        .bind(&contact.state)
        .bind(&contact.zipcode)
        .bind(&contact.country)
        .bind(contact.points)
        .bind(contact.date_added.timestamp())
        .bind(encode_extra(&contact.extra)?)
        .execute(&self.pool)
        .await?;

        contact.id = result.last_insert_rowid();
        Ok(contact.id)
    }

    /// Insert a new company, assigning its id
    pub async fn insert_company(&self, company: &mut LocalCompany) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO companies (
                name, email, phone, fax, address1, address2, city, state,
                zipcode, country, website, description, date_added, fields
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&company.name)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(&company.fax)
        .bind(&company.address1)
        .bind(&company.address2)
        .bind(&company.city)
        .bind(&company.state)
        .bind(&company.zipcode)
        .bind(&company.country)
        .bind(&company.website)
        .bind(&company.description)
        .bind(company.date_added.timestamp())
        .bind(encode_extra(&company.extra)?)
        .execute(&self.pool)
        .await?;

        company.id = result.last_insert_rowid();
        Ok(company.id)
    }

    /// Associate a contact with a company
    ///
    /// Marking a link primary demotes the contact's other links.
    pub async fn link_company(&self, contact_id: i64, company_id: i64, is_primary: bool) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if is_primary {
            sqlx::query("UPDATE contact_companies SET is_primary = 0 WHERE contact_id = ?")
                .bind(contact_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO contact_companies (contact_id, company_id, is_primary, date_added)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(contact_id, company_id) DO UPDATE SET
                is_primary = excluded.is_primary
            "#,
        )
        .bind(contact_id)
        .bind(company_id)
        .bind(is_primary)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn contacts_for_sync<'a>(
        &'a self,
        selection: &SyncSelection,
    ) -> Result<BoxStream<'a, Result<LocalContact>>> {
        let declared = self.declared_fields(Concept::Contact).await?;
        let (full_sync, from, to) = window_binds(&selection.window);
        debug!(?selection, "Streaming contacts for sync");

        let stream = sqlx::query(CONTACTS_FOR_SYNC)
            .bind(full_sync)
            .bind(from)
            .bind(to)
            .bind(limit_bind(selection.limit))
            .fetch(&self.pool)
            .map(move |row| contact_from_row(&row?, &declared))
            .boxed();

        Ok(stream)
    }

    async fn companies_for_sync<'a>(
        &'a self,
        selection: &SyncSelection,
    ) -> Result<BoxStream<'a, Result<LocalCompany>>> {
        let declared = self.declared_fields(Concept::Company).await?;
        let (full_sync, from, to) = window_binds(&selection.window);
        debug!(?selection, "Streaming companies for sync");

        let stream = sqlx::query(COMPANIES_FOR_SYNC)
            .bind(full_sync)
            .bind(from)
            .bind(to)
            .bind(limit_bind(selection.limit))
            .fetch(&self.pool)
            .map(move |row| company_from_row(&row?, &declared))
            .boxed();

        Ok(stream)
    }

    async fn companies_for_contact(&self, contact_id: i64) -> Result<Vec<CompanyLink>> {
        let rows = sqlx::query(
            r#"
            SELECT company_id, is_primary
            FROM contact_companies
            WHERE contact_id = ?
            ORDER BY is_primary DESC, date_added
            "#,
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CompanyLink {
                    company_id: row.try_get("company_id")?,
                    is_primary: row.try_get::<i64, _>("is_primary")? != 0,
                })
            })
            .collect()
    }

    async fn load_contact(&self, id: i64) -> Result<LocalContact> {
        let declared = self.declared_fields(Concept::Contact).await?;
        let sql = format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("contact {}", id)))?;

        contact_from_row(&row, &declared)
    }

    async fn load_company(&self, id: i64) -> Result<LocalCompany> {
        let declared = self.declared_fields(Concept::Company).await?;
        let sql = format!("SELECT {} FROM companies WHERE id = ?", COMPANY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("company {}", id)))?;

        company_from_row(&row, &declared)
    }

    async fn save_contact(&self, contact: &LocalContact) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE contacts SET
                title = ?, firstname = ?, lastname = ?, email = ?, phone = ?,
                mobile = ?, position = ?, address1 = ?, address2 = ?, city = ?,
                state = ?, zipcode = ?, country = ?, points = ?, fields = ?
            WHERE id = ?
            "#,
        )
        .bind(&contact.title)
        .bind(&contact.firstname)
        .bind(&contact.lastname)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.mobile)
        .bind(&contact.position)
        .bind(&contact.address1)
        .bind(&contact.address2)
        .bind(&contact.city)
        .bind(&contact.state)
        .bind(&contact.zipcode)
        .bind(&contact.country)
        .bind(contact.points)
        .bind(encode_extra(&contact.extra)?)
        .bind(contact.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("contact {}", contact.id)));
        }
        Ok(())
    }

    async fn save_company(&self, company: &LocalCompany) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies SET
                name = ?, email = ?, phone = ?, fax = ?, address1 = ?, address2 = ?,
                city = ?, state = ?, zipcode = ?, country = ?, website = ?,
                description = ?, fields = ?
            WHERE id = ?
            "#,
        )
        .bind(&company.name)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(&company.fax)
        .bind(&company.address1)
        .bind(&company.address2)
        .bind(&company.city)
        .bind(&company.state)
        .bind(&company.zipcode)
        .bind(&company.country)
        .bind(&company.website)
        .bind(&company.description)
        .bind(encode_extra(&company.extra)?)
        .bind(company.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("company {}", company.id)));
        }
        Ok(())
    }
}

fn window_binds(window: &SyncWindow) -> (i64, i64, i64) {
    match window {
        SyncWindow::All => (1, 0, 0),
        SyncWindow::Range { from, to } => (0, from.timestamp(), to.timestamp()),
    }
}

fn limit_bind(limit: Option<u32>) -> i64 {
    limit.map(i64::from).unwrap_or(-1)
}

fn timestamp_from_row(row: &SqliteRow) -> Result<DateTime<Utc>> {
    let seconds: i64 = row.try_get("date_added")?;
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::Internal(format!("Invalid date_added timestamp {}", seconds)))
}

fn encode_extra(extra: &BTreeMap<String, FieldValue>) -> Result<String> {
    Ok(serde_json::to_string(extra)?)
}

/// Stored custom values plus a Null slot for every declared alias
fn decode_extra(json: &str, declared: &[String]) -> Result<BTreeMap<String, FieldValue>> {
    let mut extra: BTreeMap<String, FieldValue> = if json.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_json::from_str(json)?
    };

    for alias in declared {
        extra.entry(alias.clone()).or_insert(FieldValue::Null);
    }

    Ok(extra)
}

fn contact_from_row(row: &SqliteRow, declared: &[String]) -> Result<LocalContact> {
    let fields: String = row.try_get("fields")?;

    Ok(LocalContact {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        firstname: row.try_get("firstname")?,
        lastname: row.try_get("lastname")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        mobile: row.try_get("mobile")?,
        position: row.try_get("position")?,
        address1: row.try_get("address1")?,
        address2: row.try_get("address2")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zipcode: row.try_get("zipcode")?,
        country: row.try_get("country")?,
        points: row.try_get("points")?,
        date_added: timestamp_from_row(row)?,
        extra: decode_extra(&fields, declared)?,
    })
}

fn company_from_row(row: &SqliteRow, declared: &[String]) -> Result<LocalCompany> {
    let fields: String = row.try_get("fields")?;

    Ok(LocalCompany {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        fax: row.try_get("fax")?,
        address1: row.try_get("address1")?,
        address2: row.try_get("address2")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zipcode: row.try_get("zipcode")?,
        country: row.try_get("country")?,
        website: row.try_get("website")?,
        description: row.try_get("description")?,
        date_added: timestamp_from_row(row)?,
        extra: decode_extra(&fields, declared)?,
    })
}
