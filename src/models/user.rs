use serde::{Deserialize, Serialize};

use crate::schema::{Entity, EntitySchema, FieldDef, FieldKind, Validate};

pub const ROLES: &[&str] = &["user", "admin"];
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

pub const USER_SCHEMA: EntitySchema = EntitySchema {
    name: "User",
    collection: "users",
    fields: &[
        FieldDef::plain("email", FieldKind::Text),
        FieldDef::plain("name", FieldKind::Text),
        FieldDef::plain("passwordHash", FieldKind::Text),
        FieldDef::plain("role", FieldKind::Enum(ROLES)),
    ],
};

/// Stored account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct User {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Stored-form partial update. Built from a [`UserPatch`] once any new
/// password has been hashed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Create payload. The plain password never reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl NewUser {
    pub fn into_user(self, password_hash: String) -> User {
        User {
            email: normalize_email(&self.email),
            name: self.name,
            password_hash,
            role: self.role,
        }
    }
}

impl UserPatch {
    pub fn into_changes(self, password_hash: Option<String>) -> UserChanges {
        UserChanges {
            email: self.email.as_deref().map(normalize_email),
            name: self.name,
            password_hash,
            role: self.role,
        }
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(format!("email '{}' is not a valid address", email)),
    }
}

fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    Ok(())
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        validate_password(&self.password)
    }
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok(())
}

impl Validate for User {
    fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        if self.password_hash.is_empty() {
            return Err("passwordHash must not be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for UserChanges {
    fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if matches!(&self.password_hash, Some(hash) if hash.is_empty()) {
            return Err("passwordHash must not be empty".to_string());
        }
        Ok(())
    }
}

/// Stored records go through the generic engine only after the account
/// service has normalized the email and hashed the password.
impl Entity for User {
    const SCHEMA: &'static EntitySchema = &USER_SCHEMA;
    const HIDDEN_FIELDS: &'static [&'static str] = &["passwordHash"];

    type New = User;
    type Patch = UserChanges;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::to_document;
    use serde_json::json;

    #[test]
    fn new_user_normalizes_email() {
        let new: NewUser = serde_json::from_value(json!({
            "email": " Lan@Example.com ",
            "name": "Lan",
            "password": "correct horse"
        }))
        .unwrap();
        new.validate().unwrap();

        let doc = to_document(&new.into_user("$2b$04$hash".into())).unwrap();
        assert_eq!(doc["email"], "lan@example.com");
        assert_eq!(doc["role"], "user");
        assert_eq!(doc["passwordHash"], "$2b$04$hash");
        assert!(doc.get("password").is_none());
    }

    #[test]
    fn changes_carry_only_given_fields() {
        let patch = UserPatch { email: Some("X@Example.com".into()), password: Some("another secret".into()), ..Default::default() };
        let set = to_document(&patch.into_changes(Some("$2b$04$hash".into()))).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set["email"], "x@example.com");
        assert_eq!(set["passwordHash"], "$2b$04$hash");
    }

    #[test]
    fn stored_changes_reject_empty_values() {
        assert!(UserChanges { name: Some(" ".into()), ..Default::default() }.validate().is_err());
        assert!(UserChanges { password_hash: Some(String::new()), ..Default::default() }.validate().is_err());
        assert!(UserChanges::default().validate().is_ok());
    }

    #[test]
    fn rejects_weak_input() {
        let short = NewUser { email: "a@b.io".into(), name: "A".into(), password: "short".into(), role: Role::User };
        assert!(short.validate().unwrap_err().contains("at least 8"));
        let bad_mail = NewUser { email: "nobody".into(), name: "A".into(), password: "long enough".into(), role: Role::User };
        assert!(bad_mail.validate().unwrap_err().contains("not a valid address"));
    }
}
