//! Typed request payloads
//!
//! One struct per write operation. Unknown JSON fields are dropped by serde;
//! everything else is checked by the [`Validate`] impls below before the
//! request reaches authorization.

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use clubhouse_auth::RoleRegistry;
use clubhouse_core::{
    CatalogConfig, Company, CompanyMember, Event, FieldErrors, Link, Member, Resource, UserPatch,
    Validate,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// What payload checks are measured against
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub catalog: CatalogConfig,
    pub roles: Arc<RoleRegistry>,
}

fn check_links(errors: &mut FieldErrors, links: &[Link]) {
    for (index, link) in links.iter().enumerate() {
        errors.nested(format!("links[{}]", index), |errors| {
            errors.url("link", link.link.as_deref());
        });
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    #[serde(default)]
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub title: String,
    pub email: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub rank: i64,
    pub image: Option<String>,
}

impl NewMember {
    pub fn into_member(self, id: String) -> Member {
        Member {
            id,
            name: self.name,
            display_name: self.display_name,
            title: self.title,
            email: self.email,
            description: self.description,
            facts: self.facts,
            links: self.links,
            positions: self.positions,
            terms: self.terms,
            rank: self.rank,
            image: self.image,
        }
    }
}

impl Validate for NewMember {
    type Rules = ValidationRules;

    fn validate(&self, rules: &ValidationRules, errors: &mut FieldErrors) {
        errors.required("name", &self.name);
        errors.required("title", &self.title);
        errors.email("email", self.email.as_deref());
        check_links(errors, &self.links);
        errors.each_one_of("positions", &self.positions, &rules.catalog.member_positions, "position");
        errors.each_one_of("terms", &self.terms, &rules.catalog.member_terms, "term");
    }
}

/// One element of a bulk member update; absent fields stay as stored
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemberUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MemberUpdate {
    /// The partial document handed to the store's merge
    pub fn to_patch(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Validate for MemberUpdate {
    type Rules = ValidationRules;

    fn validate(&self, rules: &ValidationRules, errors: &mut FieldErrors) {
        errors.required("id", &self.id);
        errors.non_empty("name", self.name.as_deref());
        errors.non_empty("title", self.title.as_deref());
        errors.email("email", self.email.as_deref());
        if let Some(links) = &self.links {
            check_links(errors, links);
        }
        if let Some(positions) = &self.positions {
            errors.each_one_of("positions", positions, &rules.catalog.member_positions, "position");
        }
        if let Some(terms) = &self.terms {
            errors.each_one_of("terms", terms, &rules.catalog.member_terms, "term");
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersBulkUpdate {
    pub members: Vec<MemberUpdate>,
}

impl Validate for MembersBulkUpdate {
    type Rules = ValidationRules;

    fn validate(&self, rules: &ValidationRules, errors: &mut FieldErrors) {
        for (index, member) in self.members.iter().enumerate() {
            errors.nested(format!("members[{}]", index), |errors| {
                member.validate(rules, errors)
            });
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<String>,
}

impl UserUpdate {
    pub fn into_patch(self, id: String) -> UserPatch {
        UserPatch {
            id,
            username: self.username,
            email: self.email,
            provider: self.provider,
            avatar_url: self.avatar_url,
            role: self.role,
        }
    }
}

impl Validate for UserUpdate {
    type Rules = ValidationRules;

    fn validate(&self, rules: &ValidationRules, errors: &mut FieldErrors) {
        errors.non_empty("username", self.username.as_deref());
        errors.email("email", self.email.as_deref());
        errors.one_of("role", self.role.as_deref(), rules.roles.labels(), "role");
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompanyMember {
    #[serde(default)]
    pub member_id: String,
    pub term: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    #[serde(default)]
    pub name: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub members: Vec<NewCompanyMember>,
    pub image: Option<String>,
}

impl NewCompany {
    pub fn into_company(self, id: String) -> Company {
        Company {
            id,
            name: self.name,
            display_name: self.display_name,
            email: self.email,
            description: self.description,
            links: self.links,
            members: self
                .members
                .into_iter()
                .map(|m| CompanyMember {
                    member_id: m.member_id,
                    term: m.term,
                    tools: m.tools,
                })
                .collect(),
            image: self.image,
        }
    }
}

impl Validate for NewCompany {
    type Rules = ValidationRules;

    fn validate(&self, _rules: &ValidationRules, errors: &mut FieldErrors) {
        errors.required("name", &self.name);
        errors.email("email", self.email.as_deref());
        check_links(errors, &self.links);
        for (index, member) in self.members.iter().enumerate() {
            errors.nested(format!("members[{}]", index), |errors| {
                errors.required("member_id", &member.member_id);
            });
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    #[serde(default)]
    pub name: String,
    pub title: Option<String>,
    pub term: Option<String>,
    #[serde(alias = "type")]
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub photo_credits: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewEvent {
    pub fn into_event(self, id: String) -> Event {
        Event {
            id,
            name: self.name,
            title: self.title,
            term: self.term,
            event_type: self.event_type,
            location: self.location,
            description: self.description,
            date: self.date,
            photo_credits: self.photo_credits,
            images: self.images,
        }
    }
}

impl Validate for NewEvent {
    type Rules = ValidationRules;

    fn validate(&self, rules: &ValidationRules, errors: &mut FieldErrors) {
        errors.required("name", &self.name);
        errors.one_of(
            "event_type",
            self.event_type.as_deref(),
            &rules.catalog.event_types,
            "event type",
        );
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResource {
    #[serde(default)]
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub link: Option<String>,
    pub image: Option<String>,
}

impl NewResource {
    pub fn into_resource(self, id: String) -> Resource {
        Resource {
            id,
            name: self.name,
            title: self.title,
            description: self.description,
            types: self.types,
            link: self.link,
            image: self.image,
        }
    }
}

impl Validate for NewResource {
    type Rules = ValidationRules;

    fn validate(&self, rules: &ValidationRules, errors: &mut FieldErrors) {
        errors.required("name", &self.name);
        errors.url("link", self.link.as_deref());
        errors.each_one_of("types", &self.types, &rules.catalog.resource_types, "resource type");
    }
}

/// JSON body that has already passed validation.
///
/// Runs before any authorization work, so a malformed payload is rejected
/// with field errors regardless of who sent it.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest<AppState> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate<Rules = ValidationRules> + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value.validated(&state.rules)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_core::{ClubError, FieldError};
    use serde_json::json;

    fn rules() -> ValidationRules {
        ValidationRules {
            catalog: CatalogConfig::default(),
            roles: Arc::new(RoleRegistry::default()),
        }
    }

    fn fields<T: Validate<Rules = ValidationRules>>(value: T) -> Vec<String> {
        match value.validated(&rules()) {
            Ok(_) => Vec::new(),
            Err(ClubError::Validation { errors, .. }) => {
                errors.into_iter().map(|FieldError { field, .. }| field).collect()
            }
            Err(other) => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_member_requires_name_and_title() {
        let member: NewMember = serde_json::from_value(json!({
            "email": "not-an-email",
            "links": [{"title": "site", "link": "https://ok.example"}, {"link": "nope"}],
            "positions": ["Wizard"],
            "unknown_field": true
        }))
        .unwrap();

        assert_eq!(
            fields(member),
            vec!["name", "title", "email", "links[1].link", "positions[0]"]
        );
    }

    #[test]
    fn test_new_member_defaults_rank() {
        let member: NewMember =
            serde_json::from_value(json!({"name": "Ada", "title": "Chair"})).unwrap();
        let member = member.validated(&rules()).unwrap().into_member("m1".to_string());
        assert_eq!(member.rank, 0);
    }

    #[test]
    fn test_bulk_update_reports_indexed_paths() {
        let update: MembersBulkUpdate = serde_json::from_value(json!({
            "members": [
                {"id": "a", "rank": 1},
                {"id": "b", "rank": 2},
                {"id": "c", "email": "bad"},
                {"rank": 4}
            ]
        }))
        .unwrap();

        assert_eq!(fields(update), vec!["members[2].email", "members[3].id"]);
    }

    #[test]
    fn test_member_update_patch_omits_absent_fields() {
        let update: MemberUpdate = serde_json::from_value(json!({"id": "a", "rank": 3})).unwrap();
        assert_eq!(update.to_patch().unwrap(), json!({"id": "a", "rank": 3}));
    }

    #[test]
    fn test_user_update_role_must_be_registered() {
        let ok = UserUpdate {
            role: Some("manage".to_string()),
            ..UserUpdate::default()
        };
        assert!(fields(ok).is_empty());

        let bad = UserUpdate {
            role: Some("superuser".to_string()),
            username: Some(" ".to_string()),
            ..UserUpdate::default()
        };
        assert_eq!(fields(bad), vec!["username", "role"]);
    }

    #[test]
    fn test_company_event_and_resource_rules() {
        let company: NewCompany = serde_json::from_value(json!({
            "name": "Acme",
            "members": [{"member_id": "m1"}, {"term": "fall"}]
        }))
        .unwrap();
        assert_eq!(fields(company), vec!["members[1].member_id"]);

        let event: NewEvent =
            serde_json::from_value(json!({"name": "Kickoff", "type": "rave"})).unwrap();
        assert_eq!(fields(event), vec!["event_type"]);

        let resource: NewResource = serde_json::from_value(json!({
            "name": "Docs",
            "link": "ftp://files.example",
            "types": ["video", "nope"]
        }))
        .unwrap();
        let reported = fields(resource);
        assert!(reported.contains(&"link".to_string()));
        assert!(reported.contains(&"types[1]".to_string()));
    }
}
