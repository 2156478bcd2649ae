//! Form instance: build, apply inputs, submit
//!
//! ```text
//! FormBuilder ──build──► FormInstance ──apply(input)──► answer write
//!                             ▲                              │
//!                             └──── visibility re-evaluated ◄┘
//!                             │
//!                          submit() ──► Submission
//! ```

use crate::config::{EngineConfig, DEFAULT_ACCEPTED_TYPES, DEFAULT_MAX_FILES};
use crate::control::{ControlKind, FieldControl, UploadControl, UploadDefaults};
use crate::error::{FieldViolation, FormError, FormResult, UploadError, ViolationReason};
use crate::events::FormEvent;
use crate::input::{FieldInput, InputValue};
use crate::lookup::{RelatedPerson, RelationshipLookup};
use crate::sink::SubmissionSink;
use crate::submission::Submission;
use agriforms_attach::{AttachmentValidator, ValidatorConfig};
use agriforms_schema::{
    lint, AnswerMap, AnswerValue, FieldKind, FieldOption, FormSchema, Relation, SchemaWarning,
    UploadedFile, VisibilityEvaluator, VisibilitySet,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Builder
// =============================================================================

/// Builds a [`FormInstance`] from a schema
pub struct FormBuilder {
    schema: FormSchema,
    parent: Option<i64>,
    validator: Option<Arc<AttachmentValidator>>,
    validator_config: ValidatorConfig,
    defaults: UploadDefaults,
}

impl FormBuilder {
    /// Builder with default engine settings and no parent member
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            parent: None,
            validator: None,
            validator_config: ValidatorConfig::default(),
            defaults: UploadDefaults {
                max_files: DEFAULT_MAX_FILES,
                accepted_types: DEFAULT_ACCEPTED_TYPES.into(),
            },
        }
    }

    /// Apply engine defaults and attachment settings
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.validator_config = config.attachments.clone();
        self.defaults = UploadDefaults {
            max_files: config.default_max_files,
            accepted_types: config.default_accepted_types.clone(),
        };
        self
    }

    /// Share an already-built validator between instances
    pub fn with_validator(mut self, validator: Arc<AttachmentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Member whose children and spouses populate lookup fields
    pub fn with_parent(mut self, parent: i64) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Build, populating lookup controls from `lookup`
    pub async fn build(self, lookup: &dyn RelationshipLookup) -> FormResult<FormInstance> {
        let mut records = HashMap::new();
        if let Some(parent) = self.parent {
            for relation in self.relations() {
                let related = lookup.related(parent, relation).await?;
                tracing::debug!(parent, %relation, count = related.len(), "lookup populated");
                records.insert(relation, related);
            }
        }
        self.assemble(records)
    }

    /// Build without lookups; lookup controls offer no records
    pub fn build_offline(self) -> FormResult<FormInstance> {
        self.assemble(HashMap::new())
    }

    fn relations(&self) -> BTreeSet<Relation> {
        self.schema
            .fields
            .iter()
            .filter_map(|f| match f.kind {
                FieldKind::Lookup(relation) => Some(relation),
                _ => None,
            })
            .collect()
    }

    fn assemble(self, records: HashMap<Relation, Vec<RelatedPerson>>) -> FormResult<FormInstance> {
        self.schema.ensure_unique_names()?;

        let warnings = lint(&self.schema);
        for warning in &warnings {
            tracing::warn!(form = %self.schema.key, "{}", warning);
        }

        let validator = match self.validator {
            Some(validator) => validator,
            None => Arc::new(AttachmentValidator::new(&self.validator_config)?),
        };

        let controls: Vec<FieldControl> = self
            .schema
            .ordered_fields()
            .into_iter()
            .map(|field| {
                let mut control = FieldControl::new(field.clone(), &self.defaults);
                if let ControlKind::Lookup { relation, records: slot } = &mut control.kind {
                    *slot = records.get(relation).cloned().unwrap_or_default();
                }
                control
            })
            .collect();

        let index = controls
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name().to_string(), i))
            .collect();

        let answers = AnswerMap::new();
        let visibility = VisibilityEvaluator::new(&self.schema).evaluate(&answers);

        tracing::debug!(
            form = %self.schema.key,
            fields = controls.len(),
            visible = visibility.visible().count(),
            warnings = warnings.len(),
            "form instance built"
        );

        Ok(FormInstance {
            id: Uuid::new_v4(),
            schema: self.schema,
            controls,
            index,
            answers,
            visibility,
            validator,
            warnings,
            events: Vec::new(),
        })
    }
}

// =============================================================================
// Instance
// =============================================================================

/// A live form: controls, answers and visibility for one render
pub struct FormInstance {
    id: Uuid,
    schema: FormSchema,
    controls: Vec<FieldControl>,
    index: HashMap<String, usize>,
    answers: AnswerMap,
    visibility: VisibilitySet,
    validator: Arc<AttachmentValidator>,
    warnings: Vec<SchemaWarning>,
    events: Vec<FormEvent>,
}

/// Answer-map write decided for one input
enum Update {
    Set(AnswerValue),
    Clear,
    AddFile(UploadedFile),
    RemoveFile(usize),
}

impl FormInstance {
    /// Instance id, also carried by its events
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Schema the instance was built from
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Controls in canonical field order
    pub fn controls(&self) -> &[FieldControl] {
        &self.controls
    }

    /// Control of the named field
    pub fn control(&self, name: &str) -> Option<&FieldControl> {
        self.index.get(name).map(|&i| &self.controls[i])
    }

    /// Live answer map, including answers of hidden fields
    pub fn current_answers(&self) -> &AnswerMap {
        &self.answers
    }

    /// Visibility after the last input
    pub fn visibility(&self) -> &VisibilitySet {
        &self.visibility
    }

    /// Whether the named field is shown
    pub fn is_visible(&self, name: &str) -> bool {
        self.visibility.is_visible(name)
    }

    /// Lint warnings found when the instance was built
    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    /// Drain recorded events
    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether `field` is an upload control below its file limit
    pub fn can_upload(&self, field: &str) -> bool {
        match self.control(field).map(|c| &c.kind) {
            Some(ControlKind::Upload(upload)) => self.file_count(field) < upload.max_files as usize,
            _ => false,
        }
    }

    /// Apply one input and re-evaluate visibility.
    ///
    /// Returns the fields whose visibility toggled, with their new state.
    /// On error the answer map is unchanged.
    pub fn apply(&mut self, input: FieldInput) -> FormResult<Vec<(String, bool)>> {
        let FieldInput { field, value } = input;
        let Some(&idx) = self.index.get(&field) else {
            return Err(FormError::UnknownField(field));
        };

        let upload_name = match &value {
            InputValue::AddFile { filename, .. } => Some(filename.clone()),
            _ => None,
        };

        let update = match self.resolve(idx, value) {
            Ok(update) => update,
            Err(err) => {
                if let Some(filename) = upload_name {
                    self.record_rejection(&field, filename, &err);
                }
                return Err(err);
            }
        };

        self.write(&field, update);
        tracing::debug!(form = %self.schema.key, field = %field, "input applied");
        Ok(self.refresh_visibility())
    }

    /// Validate and collect the visible answers.
    ///
    /// Every visible required field must be answered; all violations are
    /// reported together.
    pub fn submit(&mut self) -> FormResult<Submission> {
        let violations: Vec<FieldViolation> = self
            .controls
            .iter()
            .filter(|c| c.is_collected() && c.field.required && self.is_visible(c.name()))
            .filter(|c| self.answers.get(c.name()).map_or(true, AnswerValue::is_empty))
            .map(|c| FieldViolation {
                field: c.name().to_string(),
                reason: ViolationReason::Required,
            })
            .collect();
        if !violations.is_empty() {
            tracing::debug!(form = %self.schema.key, missing = violations.len(), "submission blocked");
            return Err(FormError::Validation(violations));
        }

        let entries = self
            .controls
            .iter()
            .filter(|c| c.is_collected() && self.is_visible(c.name()))
            .map(|c| {
                let value = self.answers.get(c.name()).cloned().or_else(|| c.default_value());
                (c.name().to_string(), value)
            })
            .collect();

        let submission = Submission::new(self.schema.key.clone(), entries);
        tracing::info!(
            form = %self.schema.key,
            submission = %submission.id,
            fields = submission.len(),
            "form submitted"
        );
        self.events.push(FormEvent::Submitted {
            submission_id: submission.id,
            fields: submission.len(),
        });
        Ok(submission)
    }

    /// Submit and hand the payload to `sink`
    pub async fn submit_to(&mut self, sink: &dyn SubmissionSink) -> FormResult<Submission> {
        let submission = self.submit()?;
        let payload = submission
            .to_value()
            .map_err(|e| FormError::Sink(e.into()))?;
        sink.persist(&submission.form_key, payload).await?;
        Ok(submission)
    }

    fn file_count(&self, field: &str) -> usize {
        match self.answers.get(field) {
            Some(AnswerValue::Files(files)) => files.len(),
            _ => 0,
        }
    }

    fn resolve(&self, idx: usize, value: InputValue) -> FormResult<Update> {
        let control = &self.controls[idx];
        let name = control.name();
        let mismatch = || FormError::InputMismatch {
            field: name.to_string(),
            expected: control.expects(),
        };

        let update = match (&control.kind, value) {
            (ControlKind::Text { .. }, InputValue::Text(text)) => Update::Set(AnswerValue::Text(text)),

            (ControlKind::Number, InputValue::Number(Some(n))) if n.is_finite() => {
                Update::Set(AnswerValue::Number(n))
            }
            (ControlKind::Number, InputValue::Number(None)) => Update::Clear,

            (ControlKind::Date, InputValue::Date(Some(date))) => Update::Set(AnswerValue::Date(date)),
            (ControlKind::Date, InputValue::Date(None)) => Update::Clear,

            (ControlKind::Select { options }, InputValue::Choice(Some(choice))) => {
                check_option(name, options, &choice)?;
                Update::Set(AnswerValue::Text(choice))
            }
            (ControlKind::Select { .. }, InputValue::Choice(None)) => Update::Clear,

            (ControlKind::MultiSelect { options }, InputValue::Choices(choices)) => {
                let mut kept: Vec<String> = Vec::with_capacity(choices.len());
                for choice in choices {
                    check_option(name, options, &choice)?;
                    if !kept.contains(&choice) {
                        kept.push(choice);
                    }
                }
                if kept.is_empty() {
                    Update::Clear
                } else {
                    Update::Set(AnswerValue::Choices(kept))
                }
            }

            (ControlKind::Checkbox, InputValue::Checked(checked)) => Update::Set(AnswerValue::Bool(checked)),

            (ControlKind::Lookup { records, .. }, InputValue::Lookup(Some(id))) => {
                let person = records
                    .iter()
                    .find(|p| p.id == id)
                    .ok_or_else(|| FormError::UnknownRecord {
                        field: name.to_string(),
                        id,
                    })?;
                Update::Set(AnswerValue::Record(person.to_record()))
            }
            (ControlKind::Lookup { .. }, InputValue::Lookup(None)) => Update::Clear,

            (
                ControlKind::Upload(upload),
                InputValue::AddFile {
                    filename,
                    content_type,
                    bytes,
                },
            ) => Update::AddFile(self.accept_upload(name, upload, filename, content_type, bytes)?),
            (ControlKind::Upload(_), InputValue::RemoveFile(index)) => {
                if index >= self.file_count(name) {
                    return Err(FormError::FileIndexOutOfRange {
                        field: name.to_string(),
                        index,
                    });
                }
                Update::RemoveFile(index)
            }

            _ => return Err(mismatch()),
        };
        Ok(update)
    }

    fn accept_upload(
        &self,
        field: &str,
        upload: &UploadControl,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    ) -> FormResult<UploadedFile> {
        if self.file_count(field) >= upload.max_files as usize {
            return Err(FormError::MaxFilesReached {
                field: field.to_string(),
                max: upload.max_files,
            });
        }

        let refused = |source: UploadError| FormError::Upload {
            field: field.to_string(),
            source,
        };
        if !upload.permits(&filename, &content_type) {
            return Err(refused(UploadError::NotAccepted {
                filename,
                accepted: upload.accepted.clone(),
            }));
        }
        self.validator
            .validate(&filename, &content_type, &bytes)
            .map_err(|rejection| refused(rejection.into()))?;

        Ok(UploadedFile::new(filename, content_type, bytes))
    }

    fn record_rejection(&mut self, field: &str, filename: String, err: &FormError) {
        let reason = match err {
            FormError::Upload {
                source: UploadError::Rejected(rejection),
                ..
            } => rejection.code().to_string(),
            FormError::Upload {
                source: UploadError::NotAccepted { .. },
                ..
            } => "not_accepted".to_string(),
            FormError::MaxFilesReached { .. } => "max_files_reached".to_string(),
            _ => return,
        };
        tracing::warn!(form = %self.schema.key, field, filename = %filename, reason = %reason, "upload refused");
        self.events.push(FormEvent::FileRejected {
            field: field.to_string(),
            filename,
            reason,
        });
    }

    fn write(&mut self, field: &str, update: Update) {
        match update {
            Update::Set(value) => {
                self.answers.insert(field.to_string(), value);
                self.events.push(FormEvent::AnswerChanged {
                    field: field.to_string(),
                    cleared: false,
                });
            }
            Update::Clear => {
                self.answers.remove(field);
                self.events.push(FormEvent::AnswerChanged {
                    field: field.to_string(),
                    cleared: true,
                });
            }
            Update::AddFile(file) => {
                tracing::info!(
                    form = %self.schema.key,
                    field,
                    filename = %file.filename,
                    size = file.size,
                    "upload accepted"
                );
                self.events.push(FormEvent::FileAccepted {
                    field: field.to_string(),
                    filename: file.filename.clone(),
                    size: file.size,
                });
                match self.answers.get_mut(field) {
                    Some(AnswerValue::Files(files)) => files.push(file),
                    _ => {
                        self.answers.insert(field.to_string(), AnswerValue::Files(vec![file]));
                    }
                }
            }
            Update::RemoveFile(index) => {
                let mut emptied = false;
                if let Some(AnswerValue::Files(files)) = self.answers.get_mut(field) {
                    let removed = files.remove(index);
                    emptied = files.is_empty();
                    self.events.push(FormEvent::FileRemoved {
                        field: field.to_string(),
                        filename: removed.filename,
                    });
                }
                if emptied {
                    self.answers.remove(field);
                }
            }
        }
    }

    /// Conditions read stored answers, hidden fields included.
    fn refresh_visibility(&mut self) -> Vec<(String, bool)> {
        let next = VisibilityEvaluator::new(&self.schema).evaluate(&self.answers);
        let changes = self.visibility.changes(&next);
        for (field, visible) in &changes {
            tracing::trace!(form = %self.schema.key, field = %field, visible, "visibility changed");
            self.events.push(FormEvent::VisibilityChanged {
                field: field.clone(),
                visible: *visible,
            });
        }
        self.visibility = next;
        changes
    }
}

fn check_option(field: &str, options: &[FieldOption], value: &str) -> FormResult<()> {
    if options.iter().any(|o| o.value == value) {
        Ok(())
    } else {
        Err(FormError::UnknownOption {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{InMemoryRelationshipLookup, RelatedPerson};
    use crate::sink::InMemorySubmissionSink;
    use agriforms_schema::{Condition, FileSpec, FormField, RelatedRecord};
    use serde_json::json;

    const PDF: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n";

    fn yes_no() -> Vec<FieldOption> {
        vec![FieldOption::new("yes", "Oui"), FieldOption::new("no", "Non")]
    }

    fn mode_detail() -> FormSchema {
        let mut schema = FormSchema::new("mode_detail");
        schema.push_field(FormField::new("mode", FieldKind::Select { options: yes_no() }));
        schema.push_field(
            FormField::new("detail", FieldKind::Text)
                .required()
                .with_condition(Condition::eq("mode", "yes")),
        );
        schema
    }

    fn upload_schema(max_files: Option<u32>) -> FormSchema {
        let mut schema = FormSchema::new("pieces");
        schema.push_field(FormField::new(
            "justificatifs",
            FieldKind::File(FileSpec {
                max_files,
                accepted_file_types: None,
            }),
        ));
        schema
    }

    #[test]
    fn test_mode_no_submits_mode_only() {
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();
        assert!(!form.is_visible("detail"));

        form.apply(FieldInput::choice("mode", "no")).unwrap();
        let submission = form.submit().unwrap();
        assert_eq!(submission.to_json().unwrap(), r#"{"mode":"no"}"#);
    }

    #[test]
    fn test_mode_yes_submits_detail() {
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();

        let changes = form.apply(FieldInput::choice("mode", "yes")).unwrap();
        assert_eq!(changes, vec![("detail".to_string(), true)]);

        form.apply(FieldInput::text("detail", "hello")).unwrap();
        let submission = form.submit().unwrap();
        assert_eq!(submission.to_json().unwrap(), r#"{"mode":"yes","detail":"hello"}"#);
    }

    #[test]
    fn test_hidden_stale_answer_is_kept_but_not_submitted() {
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();
        form.apply(FieldInput::choice("mode", "yes")).unwrap();
        form.apply(FieldInput::text("detail", "stale")).unwrap();

        let changes = form.apply(FieldInput::choice("mode", "no")).unwrap();
        assert_eq!(changes, vec![("detail".to_string(), false)]);
        assert_eq!(
            form.current_answers().get("detail"),
            Some(&AnswerValue::Text("stale".into()))
        );

        let submission = form.submit().unwrap();
        assert!(!submission.contains("detail"));
    }

    #[test]
    fn test_cascade_reads_stale_answer_of_hidden_parent() {
        let mut schema = mode_detail();
        schema.push_field(
            FormField::new("precision", FieldKind::Text).with_condition(Condition::eq("detail", "autre")),
        );
        let mut form = FormBuilder::new(schema).build_offline().unwrap();
        form.apply(FieldInput::choice("mode", "yes")).unwrap();
        form.apply(FieldInput::text("detail", "autre")).unwrap();
        assert!(form.is_visible("precision"));

        let changes = form.apply(FieldInput::choice("mode", "no")).unwrap();
        assert_eq!(changes, vec![("detail".to_string(), false)]);
        assert!(!form.is_visible("detail"));
        assert!(form.is_visible("precision"));

        let submission = form.submit().unwrap();
        assert_eq!(submission.field_names().collect::<Vec<_>>(), vec!["mode", "precision"]);
    }

    #[test]
    fn test_required_visible_field_blocks_submit() {
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();
        form.apply(FieldInput::choice("mode", "yes")).unwrap();
        form.apply(FieldInput::text("detail", "   ")).unwrap();

        match form.submit() {
            Err(FormError::Validation(violations)) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "detail");
            }
            other => panic!("expected validation error, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut schema = FormSchema::new("k");
        schema.push_field(FormField::new("cin", FieldKind::Text).required());
        schema.push_field(FormField::new("cultures", FieldKind::MultiSelect { options: yes_no() }).required());
        schema.push_field(FormField::new("titre", FieldKind::Label).required());
        let mut form = FormBuilder::new(schema).build_offline().unwrap();

        let Err(FormError::Validation(violations)) = form.submit() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["cin", "cultures"]);
    }

    #[test]
    fn test_defaults_for_unanswered_visible_fields() {
        let mut schema = FormSchema::new("k");
        schema.push_field(FormField::new("titre", FieldKind::Label));
        schema.push_field(FormField::new("nom", FieldKind::Text));
        schema.push_field(FormField::new("accord", FieldKind::Checkbox));
        schema.push_field(FormField::new("pieces", FieldKind::File(FileSpec::default())));
        schema.push_field(FormField::new("cultures", FieldKind::MultiSelect { options: yes_no() }));
        schema.push_field(FormField::new("surface", FieldKind::Number));
        let mut form = FormBuilder::new(schema).build_offline().unwrap();

        let submission = form.submit().unwrap();
        assert_eq!(
            submission.to_json().unwrap(),
            r#"{"nom":"","accord":false,"pieces":[],"cultures":[],"surface":null}"#
        );
    }

    #[test]
    fn test_canonical_order_in_submission() {
        let mut schema = FormSchema::new("k");
        schema.fields = vec![
            FormField::new("c", FieldKind::Text).with_order(2),
            FormField::new("a", FieldKind::Text).with_order(1),
            FormField::new("d", FieldKind::Text),
            FormField::new("b", FieldKind::Text).with_order(1),
        ];
        let mut form = FormBuilder::new(schema).build_offline().unwrap();
        let names: Vec<_> = form.controls().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        let submission = form.submit().unwrap();
        assert_eq!(submission.field_names().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_duplicate_names_are_fatal() {
        let mut schema = FormSchema::new("k");
        schema.fields = vec![
            FormField::new("x", FieldKind::Text),
            FormField::new("x", FieldKind::Number),
        ];
        assert!(matches!(
            FormBuilder::new(schema).build_offline(),
            Err(FormError::Schema(agriforms_schema::SchemaError::DuplicateField(name))) if name == "x"
        ));
    }

    #[test]
    fn test_lint_warnings_are_kept() {
        let mut schema = FormSchema::new("k");
        schema.push_field(FormField::new("y", FieldKind::Text).with_condition(Condition::eq("typo", "1")));
        let form = FormBuilder::new(schema).build_offline().unwrap();
        assert_eq!(form.warnings().len(), 1);
        assert!(!form.is_visible("y"));
    }

    #[test]
    fn test_input_errors_leave_answers_unchanged() {
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();

        assert!(matches!(
            form.apply(FieldInput::text("nope", "x")),
            Err(FormError::UnknownField(_))
        ));
        assert!(matches!(
            form.apply(FieldInput::text("mode", "yes")),
            Err(FormError::InputMismatch { expected: "choice", .. })
        ));
        assert!(matches!(
            form.apply(FieldInput::choice("mode", "maybe")),
            Err(FormError::UnknownOption { .. })
        ));
        assert!(form.current_answers().is_empty());
    }

    #[test]
    fn test_clearing_removes_answer() {
        let mut schema = FormSchema::new("k");
        schema.push_field(FormField::new("surface", FieldKind::Number));
        schema.push_field(FormField::new("accord", FieldKind::Checkbox));
        let mut form = FormBuilder::new(schema).build_offline().unwrap();

        form.apply(FieldInput::new("surface", InputValue::Number(Some(2.5)))).unwrap();
        form.apply(FieldInput::checked("accord", false)).unwrap();
        assert_eq!(form.current_answers().len(), 2);

        form.apply(FieldInput::new("surface", InputValue::Number(None))).unwrap();
        assert!(!form.current_answers().contains_key("surface"));
        assert_eq!(form.current_answers().get("accord"), Some(&AnswerValue::Bool(false)));

        assert!(form
            .apply(FieldInput::new("surface", InputValue::Number(Some(f64::NAN))))
            .is_err());
    }

    #[test]
    fn test_multiselect_dedupes_and_clears() {
        let mut schema = FormSchema::new("k");
        schema.push_field(FormField::new("r", FieldKind::MultiSelect { options: yes_no() }));
        let mut form = FormBuilder::new(schema).build_offline().unwrap();

        let choices = vec!["yes".to_string(), "no".to_string(), "yes".to_string()];
        form.apply(FieldInput::new("r", InputValue::Choices(choices))).unwrap();
        assert_eq!(
            form.current_answers().get("r"),
            Some(&AnswerValue::Choices(vec!["yes".into(), "no".into()]))
        );

        form.apply(FieldInput::new("r", InputValue::Choices(vec![]))).unwrap();
        assert!(form.current_answers().is_empty());
    }

    #[test]
    fn test_upload_accept_and_remove() {
        let mut form = FormBuilder::new(upload_schema(None)).build_offline().unwrap();
        assert!(form.can_upload("justificatifs"));

        form.apply(FieldInput::file("justificatifs", "cin.pdf", "application/pdf", PDF.to_vec()))
            .unwrap();
        form.apply(FieldInput::file("justificatifs", "rib.pdf", "application/pdf", PDF.to_vec()))
            .unwrap();

        let Some(AnswerValue::Files(files)) = form.current_answers().get("justificatifs") else {
            panic!("expected files");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].size, PDF.len());

        form.apply(FieldInput::new("justificatifs", InputValue::RemoveFile(0))).unwrap();
        let Some(AnswerValue::Files(files)) = form.current_answers().get("justificatifs") else {
            panic!("expected files");
        };
        assert_eq!(files[0].filename, "rib.pdf");

        assert!(matches!(
            form.apply(FieldInput::new("justificatifs", InputValue::RemoveFile(5))),
            Err(FormError::FileIndexOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_max_files() {
        let mut form = FormBuilder::new(upload_schema(Some(1))).build_offline().unwrap();
        form.apply(FieldInput::file("justificatifs", "a.pdf", "application/pdf", PDF.to_vec()))
            .unwrap();
        assert!(!form.can_upload("justificatifs"));

        let err = form
            .apply(FieldInput::file("justificatifs", "b.pdf", "application/pdf", PDF.to_vec()))
            .unwrap_err();
        assert!(matches!(err, FormError::MaxFilesReached { max: 1, .. }));
    }

    #[test]
    fn test_default_max_files_is_three() {
        let mut form = FormBuilder::new(upload_schema(None)).build_offline().unwrap();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            form.apply(FieldInput::file("justificatifs", name, "application/pdf", PDF.to_vec()))
                .unwrap();
        }
        assert!(!form.can_upload("justificatifs"));
    }

    #[test]
    fn test_rejected_upload_leaves_form_usable() {
        let mut form = FormBuilder::new(upload_schema(None)).build_offline().unwrap();
        form.take_events();

        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let err = form
            .apply(FieldInput::file("justificatifs", "report.pdf", "application/pdf", jpeg))
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::Upload {
                source: UploadError::Rejected(agriforms_attach::Rejection::SignatureMismatch { .. }),
                ..
            }
        ));
        assert!(form.current_answers().is_empty());
        assert_eq!(
            form.take_events(),
            vec![FormEvent::FileRejected {
                field: "justificatifs".into(),
                filename: "report.pdf".into(),
                reason: "signature_mismatch".into(),
            }]
        );

        form.apply(FieldInput::file("justificatifs", "ok.pdf", "application/pdf", PDF.to_vec()))
            .unwrap();
        assert_eq!(form.current_answers().len(), 1);
    }

    #[test]
    fn test_accepted_types_narrow_the_validator() {
        let gif = b"GIF89a\x01\x00\x01\x00".to_vec();
        let mut form = FormBuilder::new(upload_schema(None)).build_offline().unwrap();
        // gif passes the validator but is not in the default accepted list
        assert!(matches!(
            form.apply(FieldInput::file("justificatifs", "photo.gif", "image/gif", gif)),
            Err(FormError::Upload { source: UploadError::NotAccepted { .. }, .. })
        ));
    }

    #[test]
    fn test_label_takes_no_input() {
        let mut schema = FormSchema::new("k");
        schema.push_field(FormField::new("titre", FieldKind::Label));
        let mut form = FormBuilder::new(schema).build_offline().unwrap();
        assert!(matches!(
            form.apply(FieldInput::text("titre", "x")),
            Err(FormError::InputMismatch { expected: "no", .. })
        ));
    }

    #[test]
    fn test_events_in_order() {
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();
        form.apply(FieldInput::choice("mode", "yes")).unwrap();
        form.apply(FieldInput::text("detail", "x")).unwrap();
        form.submit().unwrap();

        let types: Vec<_> = form.take_events().iter().map(FormEvent::event_type).collect();
        assert_eq!(
            types,
            vec![
                "form.answer_changed",
                "form.visibility_changed",
                "form.answer_changed",
                "form.submitted"
            ]
        );
        assert!(form.take_events().is_empty());
    }

    fn family_schema() -> FormSchema {
        let mut schema = FormSchema::new("aide_naissance");
        schema.push_field(FormField::new("enfant", FieldKind::Lookup(Relation::Enfant)).required());
        schema.push_field(FormField::new("conjoint", FieldKind::Lookup(Relation::Conjoint)));
        schema
    }

    fn family() -> InMemoryRelationshipLookup {
        let lookup = InMemoryRelationshipLookup::new();
        lookup.add(7, Relation::Enfant, RelatedPerson::new(70, "TAZI", "Rayan"));
        lookup.add(7, Relation::Conjoint, RelatedPerson::new(71, "TAZI", "Houda"));
        lookup
    }

    #[tokio::test]
    async fn test_lookup_controls_are_populated() {
        let mut form = FormBuilder::new(family_schema())
            .with_parent(7)
            .build(&family())
            .await
            .unwrap();
        assert_eq!(form.control("enfant").unwrap().records().len(), 1);

        form.apply(FieldInput::new("enfant", InputValue::Lookup(Some(70)))).unwrap();
        assert_eq!(
            form.current_answers().get("enfant"),
            Some(&AnswerValue::Record(RelatedRecord {
                id: 70,
                nom: "TAZI".into(),
                prenom: "Rayan".into()
            }))
        );
        assert!(matches!(
            form.apply(FieldInput::new("conjoint", InputValue::Lookup(Some(70)))),
            Err(FormError::UnknownRecord { id: 70, .. })
        ));

        let submission = form.submit().unwrap();
        assert_eq!(
            submission.to_value().unwrap(),
            json!({"enfant": {"id": 70, "nom": "TAZI", "prenom": "Rayan"}, "conjoint": null})
        );
    }

    #[tokio::test]
    async fn test_lookup_without_parent_is_empty() {
        let form = FormBuilder::new(family_schema()).build(&family()).await.unwrap();
        assert!(form.control("enfant").unwrap().records().is_empty());
    }

    #[tokio::test]
    async fn test_submit_to_sink() {
        let sink = InMemorySubmissionSink::new();
        let mut form = FormBuilder::new(mode_detail()).build_offline().unwrap();
        form.apply(FieldInput::choice("mode", "no")).unwrap();
        form.submit_to(&sink).await.unwrap();
        assert_eq!(sink.submissions("mode_detail"), vec![json!({"mode": "no"})]);

        form.apply(FieldInput::choice("mode", "yes")).unwrap();
        form.apply(FieldInput::text("detail", "hello")).unwrap();
        form.submit_to(&sink).await.unwrap();
        let stored = sink.submissions("mode_detail");
        assert_eq!(
            serde_json::to_string(&stored[1]).unwrap(),
            r#"{"mode":"yes","detail":"hello"}"#
        );
    }

    #[test]
    fn test_config_defaults_flow_to_controls() {
        let mut config = EngineConfig::default();
        config.default_max_files = 1;
        let form = FormBuilder::new(upload_schema(None))
            .with_config(&config)
            .build_offline()
            .unwrap();
        let Some(ControlKind::Upload(upload)) = form.control("justificatifs").map(|c| &c.kind) else {
            panic!("expected upload control");
        };
        assert_eq!(upload.max_files, 1);
    }
}
