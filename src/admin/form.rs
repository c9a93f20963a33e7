use crate::admin::images::{build_image_list, ImageError, ImageList, UploadPlan};
use crate::api::{ApiError, PropertyBackend};
use crate::models::{parse_features, FeatureGroup, FeatureItem, Property, PropertyDraft};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Wizard steps, in the order the form walks them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Basic,
    Details,
    Features,
    Location,
    Images,
    Review,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Basic,
        Step::Details,
        Step::Features,
        Step::Location,
        Step::Images,
        Step::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Basic => "basic",
            Step::Details => "details",
            Step::Features => "features",
            Step::Location => "location",
            Step::Images => "images",
            Step::Review => "review",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Basic => "Información Básica",
            Step::Details => "Características",
            Step::Features => "Construcción",
            Step::Location => "Ubicación",
            Step::Images => "Imágenes",
            Step::Review => "Revisión",
        }
    }

    fn index(&self) -> usize {
        Step::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::ALL[i])
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Información incompleta en el paso {0}")]
    IncompleteStep(Step),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("Sesión expirada. Por favor inicie sesión nuevamente.")]
    Unauthorized,
    #[error("cannot update a listing that was never saved")]
    NotSaved,
    #[error("failed to encode features: {0}")]
    Features(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Which part of a feature row is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureField {
    Title,
    Value,
}

/// Multi-step admin form for creating or editing a listing
#[derive(Debug, Clone)]
pub struct PropertyForm {
    pub draft: PropertyDraft,
    pub images: ImageList,
    /// Set when editing an existing listing
    id: Option<i64>,
    active: Step,
    completed: BTreeMap<Step, bool>,
}

impl Default for PropertyForm {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyForm {
    /// Blank form for a new listing
    pub fn new() -> Self {
        Self {
            draft: PropertyDraft::default(),
            images: ImageList::default(),
            id: None,
            active: Step::Basic,
            completed: Step::ALL.iter().map(|s| (*s, false)).collect(),
        }
    }

    /// Form prefilled from an existing listing, its images staged as existing
    pub fn for_update(property: &Property) -> Self {
        Self {
            draft: PropertyDraft::from(property),
            images: build_image_list(&property.image_src),
            id: Some(property.id),
            ..Self::new()
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn active_step(&self) -> Step {
        self.active
    }

    pub fn is_completed(&self, step: Step) -> bool {
        self.completed.get(&step).copied().unwrap_or(false)
    }

    /// Check a step against the draft and record the outcome
    pub fn validate_step(&mut self, step: Step) -> bool {
        let valid = self.check(step);
        self.completed.insert(step, valid);
        valid
    }

    fn check(&self, step: Step) -> bool {
        let d = &self.draft;
        match step {
            Step::Basic => {
                !d.title.trim().is_empty()
                    && !d.short_description.trim().is_empty()
                    && !d.long_description.trim().is_empty()
                    && d.property_type.is_some()
                    && !d.status.is_empty()
                    && d.price.is_some()
            }
            Step::Details => d.lot_size.map_or(false, |size| size > 0.0),
            Step::Features => match parse_features(&d.features) {
                Ok(groups) => !groups.is_empty() && groups.iter().all(FeatureGroup::is_complete),
                Err(_) => false,
            },
            Step::Location => {
                !d.address.trim().is_empty()
                    && d.neighborhood.is_some()
                    && d.geo_coordinates.lat != 0.0
                    && d.geo_coordinates.lng != 0.0
            }
            Step::Images => self.images.visible_count() > 0,
            Step::Review => false,
        }
    }

    /// Validate the active step and advance when it passes
    pub fn next(&mut self) -> Result<Step, FormError> {
        let Some(next) = self.active.next() else {
            return Ok(self.active);
        };
        if !self.validate_step(self.active) {
            return Err(FormError::IncompleteStep(self.active));
        }
        self.active = next;
        debug!("Form moved to step {}", next);
        Ok(next)
    }

    pub fn previous(&mut self) -> Step {
        if let Some(prev) = self.active.previous() {
            self.active = prev;
        }
        self.active
    }

    /// Jump to any step; the one being left is validated but never blocks the jump
    pub fn go_to(&mut self, step: Step) {
        self.validate_step(self.active);
        self.active = step;
    }

    /// First step that does not validate, review excluded
    pub fn first_incomplete(&mut self) -> Option<Step> {
        Step::ALL
            .into_iter()
            .filter(|s| *s != Step::Review)
            .find(|s| !self.validate_step(*s))
    }

    pub fn feature_groups(&self) -> Vec<FeatureGroup> {
        parse_features(&self.draft.features).unwrap_or_default()
    }

    fn edit_features<F>(&mut self, edit: F) -> Result<(), FormError>
    where
        F: FnOnce(&mut Vec<FeatureGroup>),
    {
        let mut groups = self.feature_groups();
        edit(&mut groups);
        self.draft.features = serde_json::to_string(&groups)?;
        Ok(())
    }

    pub fn add_feature_group(&mut self) -> Result<(), FormError> {
        self.edit_features(|groups| groups.push(FeatureGroup::default()))
    }

    pub fn remove_feature_group(&mut self, group: usize) -> Result<(), FormError> {
        self.edit_features(|groups| {
            if group < groups.len() {
                groups.remove(group);
            }
        })
    }

    pub fn set_feature_group_title(&mut self, group: usize, title: &str) -> Result<(), FormError> {
        self.edit_features(|groups| {
            if let Some(g) = groups.get_mut(group) {
                g.title = title.to_string();
            }
        })
    }

    pub fn add_feature_value(&mut self, group: usize) -> Result<(), FormError> {
        self.edit_features(|groups| {
            if let Some(g) = groups.get_mut(group) {
                g.values.push(FeatureItem::default());
            }
        })
    }

    pub fn set_feature_value(
        &mut self,
        group: usize,
        item: usize,
        field: FeatureField,
        text: &str,
    ) -> Result<(), FormError> {
        self.edit_features(|groups| {
            if let Some(row) = groups.get_mut(group).and_then(|g| g.values.get_mut(item)) {
                match field {
                    FeatureField::Title => row.title = text.to_string(),
                    FeatureField::Value => row.value = text.to_string(),
                }
            }
        })
    }

    pub fn remove_feature_value(&mut self, group: usize, item: usize) -> Result<(), FormError> {
        self.edit_features(|groups| {
            if let Some(g) = groups.get_mut(group) {
                if item < g.values.len() {
                    g.values.remove(item);
                }
            }
        })
    }

    /// Draft with `imageSrc` reduced to the images still shown, plus the upload plan
    fn payload(&self) -> (PropertyDraft, UploadPlan) {
        let plan = self.images.diff();
        let mut draft = self.draft.clone();
        draft.image_src = plan.kept_urls.clone();
        (draft, plan)
    }

    fn ready(&mut self, token: Option<&str>) -> Result<String, FormError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(FormError::Unauthorized)?
            .to_string();
        if let Some(step) = self.first_incomplete() {
            return Err(FormError::IncompleteStep(step));
        }
        Ok(token)
    }

    pub async fn submit_create(
        &mut self,
        backend: &dyn PropertyBackend,
        token: Option<&str>,
    ) -> Result<Property, FormError> {
        let token = self.ready(token)?;
        let (draft, plan) = self.payload();

        let created = backend.create(&draft, &plan.files, &token).await?;
        info!("Created property {} ({})", created.id, created.title);
        self.id = Some(created.id);
        Ok(created)
    }

    pub async fn submit_update(
        &mut self,
        backend: &dyn PropertyBackend,
        token: Option<&str>,
    ) -> Result<Property, FormError> {
        let id = self.id.ok_or(FormError::NotSaved)?;
        let token = self.ready(token)?;
        let (draft, plan) = self.payload();

        let updated = backend
            .update(id, &draft, &plan.deleted_urls, &plan.files, &token)
            .await?;
        info!("Updated property {}", updated.id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::FakeBackend;
    use crate::models::property::fixtures::property;
    use crate::models::Neighborhood;
    use std::path::PathBuf;

    fn complete_form() -> PropertyForm {
        let mut form = PropertyForm::new();
        form.draft.title = "Casa".into();
        form.draft.short_description = "Linda".into();
        form.draft.long_description = "Muy linda".into();
        form.draft.price = Some(120_000.0);
        form.draft.lot_size = Some(450.0);
        form.draft.address = "Ruta 10 km 5".into();
        form.draft.neighborhood = Some(Neighborhood::Arachania);
        form.add_feature_group().unwrap();
        form.set_feature_group_title(0, "Interior").unwrap();
        form.add_feature_value(0).unwrap();
        form.set_feature_value(0, 0, FeatureField::Title, "Pisos").unwrap();
        form.set_feature_value(0, 0, FeatureField::Value, "Madera").unwrap();
        form.images.add_files(["/tmp/front.jpg"]).unwrap();
        form
    }

    #[test]
    fn blank_form_starts_on_basic_with_defaults() {
        let form = PropertyForm::new();
        assert_eq!(form.active_step(), Step::Basic);
        assert!(Step::ALL.iter().all(|s| !form.is_completed(*s)));
        assert!(form.draft.approved);
        assert!(!form.draft.pinned);
    }

    #[test]
    fn next_blocks_on_incomplete_step() {
        let mut form = PropertyForm::new();
        assert!(matches!(form.next(), Err(FormError::IncompleteStep(Step::Basic))));
        assert_eq!(form.active_step(), Step::Basic);

        form.draft.title = "Casa".into();
        form.draft.short_description = "a".into();
        form.draft.long_description = "b".into();
        form.draft.price = Some(0.0);
        assert_eq!(form.next().unwrap(), Step::Details);
        assert!(form.is_completed(Step::Basic));

        form.draft.lot_size = Some(0.0);
        assert!(form.next().is_err());
        form.draft.lot_size = Some(10.0);
        assert_eq!(form.next().unwrap(), Step::Features);
    }

    #[test]
    fn walks_every_step_and_stops_at_review() {
        let mut form = complete_form();
        for expected in [Step::Details, Step::Features, Step::Location, Step::Images, Step::Review] {
            assert_eq!(form.next().unwrap(), expected);
        }
        assert_eq!(form.next().unwrap(), Step::Review);
        assert_eq!(form.previous(), Step::Images);
        assert!(!form.validate_step(Step::Review));
    }

    #[test]
    fn go_to_records_completion_without_blocking() {
        let mut form = PropertyForm::new();
        form.go_to(Step::Location);
        assert_eq!(form.active_step(), Step::Location);
        assert!(!form.is_completed(Step::Basic));
        assert_eq!(form.previous(), Step::Features);
    }

    #[test]
    fn features_step_needs_titled_groups_with_values() {
        let mut form = PropertyForm::new();
        assert!(!form.validate_step(Step::Features));

        form.add_feature_group().unwrap();
        assert!(!form.validate_step(Step::Features));
        form.set_feature_group_title(0, "Exterior").unwrap();
        assert!(!form.validate_step(Step::Features));
        form.add_feature_value(0).unwrap();
        assert!(form.validate_step(Step::Features));

        form.remove_feature_value(0, 0).unwrap();
        assert!(!form.validate_step(Step::Features));
        form.remove_feature_group(0).unwrap();
        assert_eq!(form.draft.features, "[]");

        form.draft.features = "{broken".into();
        assert!(!form.validate_step(Step::Features));
    }

    #[test]
    fn location_requires_non_zero_coordinates() {
        let mut form = complete_form();
        assert!(form.validate_step(Step::Location));
        form.draft.geo_coordinates.lng = 0.0;
        assert!(!form.validate_step(Step::Location));
    }

    #[test]
    fn update_form_prefills_from_listing() {
        let mut listing = property(8, "Chacra");
        listing.image_src = vec!["https://cdn/1.jpg".into(), "https://cdn/2.jpg".into()];
        let form = PropertyForm::for_update(&listing);

        assert_eq!(form.id(), Some(8));
        assert_eq!(form.draft.title, "Chacra");
        assert_eq!(form.images.visible_count(), 2);
        assert!(form.images.items().iter().all(|i| !i.is_new));
    }

    #[tokio::test]
    async fn submit_requires_token_and_complete_steps() {
        let backend = FakeBackend::default();
        let mut form = complete_form();
        assert!(matches!(
            form.submit_create(&backend, None).await,
            Err(FormError::Unauthorized)
        ));

        form.draft.address.clear();
        assert!(matches!(
            form.submit_create(&backend, Some("tok")).await,
            Err(FormError::IncompleteStep(Step::Location))
        ));
    }

    #[tokio::test]
    async fn create_uploads_new_files() {
        let backend = FakeBackend::default();
        let mut form = complete_form();
        let created = form.submit_create(&backend, Some("tok")).await.unwrap();

        assert_eq!(form.id(), Some(created.id));
        let creates = backend.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].1, vec![PathBuf::from("/tmp/front.jpg")]);
        assert!(creates[0].0.image_src.is_empty());
    }

    #[tokio::test]
    async fn update_sends_deleted_urls_and_kept_order() {
        let backend = FakeBackend::default();
        let mut listing = property(8, "Chacra");
        listing.image_src = vec!["https://cdn/1.jpg".into(), "https://cdn/2.jpg".into()];
        listing.address = "Camino vecinal".into();
        listing.short_description = "a".into();
        listing.long_description = "b".into();
        listing.features = r#"[{"title":"Campo","values":[{"title":"Hectáreas","value":"5"}]}]"#.into();

        let mut form = PropertyForm::for_update(&listing);
        form.images.remove(0).unwrap();
        form.images.add_files(["/tmp/new.png"]).unwrap();
        form.images.reorder(1, 0);

        let updated = form.submit_update(&backend, Some("tok")).await.unwrap();
        assert_eq!(updated.id, 8);

        let updates = backend.updates.lock().unwrap();
        let (id, draft, deleted, files) = &updates[0];
        assert_eq!(*id, 8);
        assert_eq!(deleted, &vec!["https://cdn/1.jpg".to_string()]);
        assert_eq!(files, &vec![PathBuf::from("/tmp/new.png")]);
        assert_eq!(draft.image_src, vec!["https://cdn/2.jpg".to_string()]);
    }

    #[tokio::test]
    async fn new_form_cannot_be_submitted_as_update() {
        let backend = FakeBackend::default();
        let mut form = complete_form();
        assert!(matches!(
            form.submit_update(&backend, Some("tok")).await,
            Err(FormError::NotSaved)
        ));
    }
}
