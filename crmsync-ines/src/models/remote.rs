//! Remote Ines CRM records
//!
//! Field names serialize exactly as the remote service spells them
//! (including its `BussinesTelephone` typo). Every field is registered in
//! a capability table so field mappings can address it by remote name.

use crmsync_common::fields::{FieldAccess, FieldTable, FieldValue};
use crmsync_common::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Remote company record ("client")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RemoteClient {
    pub confidentiality: String,
    pub company_name: String,
    #[serde(rename = "Type")]
    pub kind: i64,
    pub service: String,
    pub address1: String,
    pub address2: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone: String,
    pub fax: String,
    pub website: String,
    pub comments: String,
    pub manager: i64,
    pub sales_responsable: i64,
    pub technical_responsable: i64,
    pub creation_date: String,
    pub modified_date: String,
    pub origin: i64,
    pub customer_number: i64,
    pub company_tax_code: String,
    pub vat_tax: i64,
    pub bank: String,
    pub bank_account: String,
    pub payment_method: String,
    /// Must be non-zero on create
    pub payment_method_ref: i64,
    pub discount: f64,
    pub head_quarter: i64,
    pub language: String,
    pub activity: String,
    pub accounting_code: String,
    pub scoring: String,
    pub remainder: i64,
    pub max_remainder: i64,
    pub moral: i64,
    pub folder: i64,
    pub currency: String,
    pub bank_reference: i64,
    pub tax_type: i64,
    pub vat_tax_value: i64,
    pub creator: i64,
    pub delivery: i64,
    pub billing: i64,
    pub is_new: bool,
    /// Local company id
    pub automation_ref: i64,
    pub internal_ref: i64,
    /// Embedded contacts, only sent with a combined create
    #[serde(skip_serializing_if = "ContactList::is_empty")]
    pub contacts: ContactList,
}

/// Remote person record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RemoteContact {
    pub author: i64,
    pub business_address: String,
    pub bussines_telephone: String,
    pub city: String,
    pub comment: String,
    /// Owning client reference
    pub company_ref: i64,
    pub confidentiality: String,
    pub country: String,
    pub creation_date: String,
    pub date_of_birth: String,
    pub fax: String,
    pub first_name: String,
    pub function: String,
    pub genre: String,
    pub home_address: String,
    pub home_telephone: String,
    pub is_new: bool,
    pub language: String,
    pub last_name: String,
    pub mobile_phone: String,
    pub modification_date: String,
    pub primary_mail_address: String,
    pub rang: String,
    pub secondary_mail_address: String,
    pub service: String,
    #[serde(rename = "Type")]
    pub kind: i64,
    pub state: String,
    pub zip_code: String,
    pub desabo: String,
    #[serde(rename = "NPai")]
    pub npai: String,
    pub internal_ref: i64,
    /// Local contact id
    pub automation_ref: i64,
    pub scoring: i64,
}

/// Wire wrapper around a client's embedded contacts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(rename = "ContactInfoAuto", default)]
    pub items: Vec<RemoteContact>,
}

impl ContactList {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

static CLIENT_FIELDS: Lazy<FieldTable<RemoteClient>> = Lazy::new(|| {
    crmsync_common::field_table!(RemoteClient, "client", {
        "Confidentiality" => confidentiality: text,
        "CompanyName" => company_name: text,
        "Type" => kind: int,
        "Service" => service: text,
        "Address1" => address1: text,
        "Address2" => address2: text,
        "ZipCode" => zip_code: text,
        "City" => city: text,
        "State" => state: text,
        "Country" => country: text,
        "Phone" => phone: text,
        "Fax" => fax: text,
        "Website" => website: text,
        "Comments" => comments: text,
        "Manager" => manager: int,
        "SalesResponsable" => sales_responsable: int,
        "TechnicalResponsable" => technical_responsable: int,
        "CreationDate" => creation_date: text,
        "ModifiedDate" => modified_date: text,
        "Origin" => origin: int,
        "CustomerNumber" => customer_number: int,
        "CompanyTaxCode" => company_tax_code: text,
        "VatTax" => vat_tax: int,
        "Bank" => bank: text,
        "BankAccount" => bank_account: text,
        "PaymentMethod" => payment_method: text,
        "PaymentMethodRef" => payment_method_ref: int,
        "Discount" => discount: float,
        "HeadQuarter" => head_quarter: int,
        "Language" => language: text,
        "Activity" => activity: text,
        "AccountingCode" => accounting_code: text,
        "Scoring" => scoring: text,
        "Remainder" => remainder: int,
        "MaxRemainder" => max_remainder: int,
        "Moral" => moral: int,
        "Folder" => folder: int,
        "Currency" => currency: text,
        "BankReference" => bank_reference: int,
        "TaxType" => tax_type: int,
        "VatTaxValue" => vat_tax_value: int,
        "Creator" => creator: int,
        "Delivery" => delivery: int,
        "Billing" => billing: int,
        "IsNew" => is_new: bool,
        "AutomationRef" => automation_ref: int,
        "InternalRef" => internal_ref: int,
    })
});

static CONTACT_FIELDS: Lazy<FieldTable<RemoteContact>> = Lazy::new(|| {
    crmsync_common::field_table!(RemoteContact, "remote contact", {
        "Author" => author: int,
        "BusinessAddress" => business_address: text,
        "BussinesTelephone" => bussines_telephone: text,
        "City" => city: text,
        "Comment" => comment: text,
        "CompanyRef" => company_ref: int,
        "Confidentiality" => confidentiality: text,
        "Country" => country: text,
        "CreationDate" => creation_date: text,
        "DateOfBirth" => date_of_birth: text,
        "Fax" => fax: text,
        "FirstName" => first_name: text,
        "Function" => function: text,
        "Genre" => genre: text,
        "HomeAddress" => home_address: text,
        "HomeTelephone" => home_telephone: text,
        "IsNew" => is_new: bool,
        "Language" => language: text,
        "LastName" => last_name: text,
        "MobilePhone" => mobile_phone: text,
        "ModificationDate" => modification_date: text,
        "PrimaryMailAddress" => primary_mail_address: text,
        "Rang" => rang: text,
        "SecondaryMailAddress" => secondary_mail_address: text,
        "Service" => service: text,
        "Type" => kind: int,
        "State" => state: text,
        "ZipCode" => zip_code: text,
        "Desabo" => desabo: text,
        "NPai" => npai: text,
        "InternalRef" => internal_ref: int,
        "AutomationRef" => automation_ref: int,
        "Scoring" => scoring: int,
    })
});

/// Remote client field names, sorted
pub fn client_field_names() -> Vec<&'static str> {
    CLIENT_FIELDS.names()
}

/// Remote contact field names, sorted
pub fn contact_field_names() -> Vec<&'static str> {
    CONTACT_FIELDS.names()
}

impl FieldAccess for RemoteClient {
    fn get_field(&self, name: &str) -> Result<FieldValue> {
        CLIENT_FIELDS.read(self, name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        CLIENT_FIELDS.write(self, name, value)
    }
}

impl FieldAccess for RemoteContact {
    fn get_field(&self, name: &str) -> Result<FieldValue> {
        CONTACT_FIELDS.read(self, name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        CONTACT_FIELDS.write(self, name, value)
    }
}
