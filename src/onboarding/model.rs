//! Form state and the persisted profile document.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// How the user found the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSource {
    Reddit,
    Twitter,
    LinkedIn,
    HackerNews,
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 5] = [
        Self::Reddit,
        Self::Twitter,
        Self::LinkedIn,
        Self::HackerNews,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reddit => "Reddit",
            Self::Twitter => "Twitter",
            Self::LinkedIn => "LinkedIn",
            Self::HackerNews => "HackerNews",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("Unknown source: {s}"))
    }
}

/// Form fields addressable by the field setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Email,
    Name,
    Source,
    Industry,
    JobTitle,
    CompanyName,
}

impl FormField {
    /// Fields that must be non-empty at submit, in form order.
    pub const REQUIRED: [FormField; 5] = [
        Self::Name,
        Self::Source,
        Self::Industry,
        Self::JobTitle,
        Self::CompanyName,
    ];

    /// Email comes from the navigation parameters and cannot be edited.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Email)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
            Self::Source => "source",
            Self::Industry => "industry",
            Self::JobTitle => "jobTitle",
            Self::CompanyName => "companyName",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "name" => Ok(Self::Name),
            "source" => Ok(Self::Source),
            "industry" => Ok(Self::Industry),
            "jobTitle" => Ok(Self::JobTitle),
            "companyName" => Ok(Self::CompanyName),
            other => Err(format!("Unknown form field: {other}")),
        }
    }
}

/// In-progress form values. Nothing here is persisted until submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    pub email: String,
    pub name: String,
    pub source: String,
    pub industry: String,
    pub job_title: String,
    pub company_name: String,
}

impl OnboardingForm {
    /// Form pre-filled from the navigation parameters.
    pub fn prefilled(email: Option<&str>, name: Option<&str>) -> Self {
        Self {
            email: email.unwrap_or_default().to_string(),
            name: name.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Email => &self.email,
            FormField::Name => &self.name,
            FormField::Source => &self.source,
            FormField::Industry => &self.industry,
            FormField::JobTitle => &self.job_title,
            FormField::CompanyName => &self.company_name,
        }
    }

    /// Overwrite one field. Read-only fields are left untouched and `false`
    /// is returned.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) -> bool {
        let slot = match field {
            FormField::Email => return false,
            FormField::Name => &mut self.name,
            FormField::Source => &mut self.source,
            FormField::Industry => &mut self.industry,
            FormField::JobTitle => &mut self.job_title,
            FormField::CompanyName => &mut self.company_name,
        };
        *slot = value.into();
        true
    }

    /// Required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<FormField> {
        FormField::REQUIRED
            .into_iter()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Profile record written to the `users` collection, keyed by uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDocument {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub source: String,
    pub industry: String,
    pub job_title: String,
    pub company_name: String,
    /// RFC 3339 timestamp with millisecond precision.
    pub signed_up_at: String,
}

impl UserProfileDocument {
    pub const COLLECTION: &'static str = "users";

    pub fn from_form(uid: &str, form: &OnboardingForm, signed_up_at: DateTime<Utc>) -> Self {
        Self {
            uid: uid.to_string(),
            email: form.email.clone(),
            name: form.name.clone(),
            source: form.source.clone(),
            industry: form.industry.clone(),
            job_title: form.job_title.clone(),
            company_name: form.company_name.clone(),
            signed_up_at: signed_up_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Field name/value pairs in serialized (camelCase) form.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("uid", self.uid.as_str()),
            ("email", self.email.as_str()),
            ("name", self.name.as_str()),
            ("source", self.source.as_str()),
            ("industry", self.industry.as_str()),
            ("jobTitle", self.job_title.as_str()),
            ("companyName", self.company_name.as_str()),
            ("signedUpAt", self.signed_up_at.as_str()),
        ]
    }
}
