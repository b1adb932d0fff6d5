//! Tagging over `/api/cis/tagging`.
//!
//! The API lists categories and tags by id only, so name lookups fetch each
//! object in turn. Tags are cached by id for the client's lifetime, which
//! keeps per-host assignment lookups to one list call plus cache hits.

use async_trait::async_trait;
use tracing::debug;

use super::client::{Api, VsphereClient};
use super::types::{
    AssociationRequest, CategoryCreate, CategoryModel, ObjectId, TagCreate, TagModel,
    HOST_OBJECT_TYPE,
};
use crate::domain::{
    Cardinality, CategoryId, CategorySpec, EntityType, HostId, Tag, TagAssignment, TagCategory,
    TagId,
};
use crate::error::Result;
use crate::port::TagService;

const CATEGORY_PATH: &str = "api/cis/tagging/category";
const TAG_PATH: &str = "api/cis/tagging/tag";
const ASSOCIATION_PATH: &str = "api/cis/tagging/tag-association";

fn cardinality_wire(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::Single => "SINGLE",
        Cardinality::Multiple => "MULTIPLE",
    }
}

fn entity_wire(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Host => HOST_OBJECT_TYPE,
    }
}

impl From<CategoryModel> for TagCategory {
    fn from(model: CategoryModel) -> Self {
        let cardinality = if model.cardinality.eq_ignore_ascii_case("SINGLE") {
            Cardinality::Single
        } else {
            Cardinality::Multiple
        };
        Self {
            id: CategoryId::new(model.id),
            name: model.name,
            description: model.description,
            cardinality,
        }
    }
}

impl From<TagModel> for Tag {
    fn from(model: TagModel) -> Self {
        Self {
            id: TagId::new(model.id),
            name: model.name,
            category_id: CategoryId::new(model.category_id),
            description: model.description,
        }
    }
}

impl VsphereClient {
    async fn fetch_tag(&self, id: &str) -> Result<Tag> {
        let cached = self.tag_cache.lock().get(&TagId::new(id)).cloned();
        if let Some(tag) = cached {
            return Ok(tag);
        }
        let model: TagModel = self
            .get_json(Api::Tagging("get tag"), &format!("{TAG_PATH}/{id}"), &[])
            .await?;
        let tag = Tag::from(model);
        self.tag_cache.lock().insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }
}

#[async_trait]
impl TagService for VsphereClient {
    async fn get_category(&self, name: &str) -> Result<Option<TagCategory>> {
        let api = Api::Tagging("get category");
        let ids: Vec<String> = self.get_json(api, CATEGORY_PATH, &[]).await?;
        for id in ids {
            let model: CategoryModel = self
                .get_json(api, &format!("{CATEGORY_PATH}/{id}"), &[])
                .await?;
            if model.name == name {
                return Ok(Some(model.into()));
            }
        }
        Ok(None)
    }

    async fn create_category(&self, spec: &CategorySpec) -> Result<TagCategory> {
        let body = CategoryCreate {
            name: &spec.name,
            description: &spec.description,
            cardinality: cardinality_wire(spec.cardinality),
            associable_types: vec![entity_wire(spec.applies_to)],
        };
        let id: String = self
            .post_json(Api::Tagging("create category"), CATEGORY_PATH, &[], &body)
            .await?;
        debug!(category = %spec.name, id = %id, "category created");
        Ok(TagCategory {
            id: CategoryId::new(id),
            name: spec.name.clone(),
            description: spec.description.clone(),
            cardinality: spec.cardinality,
        })
    }

    async fn get_tag(&self, name: &str) -> Result<Option<Tag>> {
        let ids: Vec<String> = self
            .get_json(Api::Tagging("get tag"), TAG_PATH, &[])
            .await?;
        for id in ids {
            let tag = self.fetch_tag(&id).await?;
            if tag.name == name {
                return Ok(Some(tag));
            }
        }
        Ok(None)
    }

    async fn create_tag(
        &self,
        name: &str,
        category: &TagCategory,
        description: &str,
    ) -> Result<Tag> {
        let body = TagCreate {
            name,
            category_id: category.id.as_str(),
            description,
        };
        let id: String = self
            .post_json(Api::Tagging("create tag"), TAG_PATH, &[], &body)
            .await?;
        let tag = Tag {
            id: TagId::new(id),
            name: name.to_string(),
            category_id: category.id.clone(),
            description: description.to_string(),
        };
        debug!(tag = %tag.name, id = %tag.id, "tag created");
        self.tag_cache.lock().insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn get_assignment(
        &self,
        category: &TagCategory,
        host: &HostId,
    ) -> Result<Option<TagAssignment>> {
        let body = AssociationRequest {
            object_id: ObjectId::host(host.as_str()),
        };
        let attached: Vec<String> = self
            .post_json(
                Api::Tagging("list attached tags"),
                ASSOCIATION_PATH,
                &[("action", "list-attached-tags")],
                &body,
            )
            .await?;
        for id in attached {
            let tag = self.fetch_tag(&id).await?;
            if tag.category_id == category.id {
                return Ok(Some(TagAssignment {
                    tag,
                    host: host.clone(),
                }));
            }
        }
        Ok(None)
    }

    async fn create_assignment(&self, tag: &Tag, host: &HostId) -> Result<TagAssignment> {
        let body = AssociationRequest {
            object_id: ObjectId::host(host.as_str()),
        };
        self.post(
            Api::Tagging("attach"),
            &format!("{ASSOCIATION_PATH}/{}", tag.id),
            &[("action", "attach")],
            &body,
        )
        .await?;
        Ok(TagAssignment {
            tag: tag.clone(),
            host: host.clone(),
        })
    }

    async fn remove_assignment(&self, assignment: &TagAssignment) -> Result<()> {
        let body = AssociationRequest {
            object_id: ObjectId::host(assignment.host.as_str()),
        };
        self.post(
            Api::Tagging("detach"),
            &format!("{ASSOCIATION_PATH}/{}", assignment.tag.id),
            &[("action", "detach")],
            &body,
        )
        .await
    }
}
