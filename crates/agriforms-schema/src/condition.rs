//! Conditional visibility
//!
//! A field without a condition is always shown. A field whose prerequisite
//! has no answer is hidden. Unknown operators show the field.

use crate::answer::AnswerMap;
use crate::field::{ConditionOperator, FormField};
use crate::schema::FormSchema;
use std::collections::{BTreeMap, HashMap};

/// Field definitions by name. The first definition wins on duplicates.
pub type FieldIndex<'a> = HashMap<&'a str, &'a FormField>;

/// Index fields by name
pub fn index_fields(fields: &[FormField]) -> FieldIndex<'_> {
    let mut index = HashMap::with_capacity(fields.len());
    for field in fields {
        index.entry(field.name.as_str()).or_insert(field);
    }
    index
}

/// Decide whether `field` is shown given the current answers
pub fn evaluate_visibility(field: &FormField, defs: &FieldIndex<'_>, answers: &AnswerMap) -> bool {
    let Some(condition) = &field.condition else {
        return true;
    };

    if !defs.contains_key(condition.field.as_str()) {
        tracing::trace!(
            field = %field.name,
            depends_on = %condition.field,
            "condition references unknown field"
        );
        return false;
    }

    let Some(other) = answers.get(&condition.field) else {
        return false;
    };

    let actual = other.condition_text();
    let target = condition.value.as_deref();
    match &condition.operator {
        ConditionOperator::Eq => target == Some(actual.as_str()),
        ConditionOperator::Ne => target != Some(actual.as_str()),
        ConditionOperator::Unknown(_) => true,
    }
}

/// Evaluate every field of `schema`
pub fn evaluate_all(schema: &FormSchema, answers: &AnswerMap) -> VisibilitySet {
    VisibilityEvaluator::new(schema).evaluate(answers)
}

/// Evaluator bound to one schema, with the field index built once
pub struct VisibilityEvaluator<'a> {
    fields: &'a [FormField],
    defs: FieldIndex<'a>,
}

impl<'a> VisibilityEvaluator<'a> {
    /// Index the schema's fields
    pub fn new(schema: &'a FormSchema) -> Self {
        Self {
            fields: &schema.fields,
            defs: index_fields(&schema.fields),
        }
    }

    /// Whether one field is shown
    pub fn is_visible(&self, field: &FormField, answers: &AnswerMap) -> bool {
        evaluate_visibility(field, &self.defs, answers)
    }

    /// State of every field
    pub fn evaluate(&self, answers: &AnswerMap) -> VisibilitySet {
        let states = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), self.is_visible(field, answers)))
            .collect();
        VisibilitySet(states)
    }
}

/// Visibility of each field of a schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilitySet(BTreeMap<String, bool>);

impl VisibilitySet {
    /// Whether `name` is currently shown. Unknown names are hidden.
    pub fn is_visible(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    /// Names of shown fields
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|(_, v)| **v).map(|(k, _)| k.as_str())
    }

    /// Fields whose state differs in `next`, with their new state
    pub fn changes(&self, next: &VisibilitySet) -> Vec<(String, bool)> {
        next.0
            .iter()
            .filter(|(name, visible)| self.0.get(name.as_str()) != Some(*visible))
            .map(|(name, visible)| (name.clone(), *visible))
            .collect()
    }

    /// Iterate over `(name, visible)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerValue;
    use crate::field::{Condition, FieldKind};
    use proptest::prelude::*;

    fn schema() -> FormSchema {
        let mut schema = FormSchema::new("k");
        schema.fields = vec![
            FormField::new("x", FieldKind::Text),
            FormField::new("y", FieldKind::Text).with_condition(Condition::eq("x", "yes")),
            FormField::new("z", FieldKind::Text).with_condition(Condition::ne("x", "yes")),
        ];
        schema
    }

    fn answers(pairs: &[(&str, AnswerValue)]) -> AnswerMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_no_condition_is_visible() {
        let set = evaluate_all(&schema(), &AnswerMap::new());
        assert!(set.is_visible("x"));
    }

    #[test]
    fn test_hidden_when_dependency_missing() {
        let mut answers = AnswerMap::new();
        // the dependent's own answer does not matter
        answers.insert("y".into(), AnswerValue::Text("stale".into()));
        let set = evaluate_all(&schema(), &answers);
        assert!(!set.is_visible("y"));
        assert!(!set.is_visible("z"));
    }

    #[test]
    fn test_eq_and_ne() {
        let s = schema();
        let yes = evaluate_all(&s, &answers(&[("x", AnswerValue::Text("yes".into()))]));
        assert!(yes.is_visible("y"));
        assert!(!yes.is_visible("z"));

        let no = evaluate_all(&s, &answers(&[("x", AnswerValue::Text("no".into()))]));
        assert!(!no.is_visible("y"));
        assert!(no.is_visible("z"));
    }

    #[test]
    fn test_checkbox_compares_as_text() {
        let mut s = FormSchema::new("k");
        s.fields = vec![
            FormField::new("accord", FieldKind::Checkbox),
            FormField::new("rib", FieldKind::Text).with_condition(Condition::eq("accord", "true")),
        ];
        let set = evaluate_all(&s, &answers(&[("accord", AnswerValue::Bool(true))]));
        assert!(set.is_visible("rib"));
    }

    #[test]
    fn test_number_condition_uses_decimal_text() {
        let mut s = FormSchema::new("k");
        s.fields = vec![
            FormField::new("count", FieldKind::Number),
            FormField::new("extra", FieldKind::Text).with_condition(Condition::eq("count", "2.0")),
            FormField::new("plain", FieldKind::Text).with_condition(Condition::eq("count", "2")),
        ];
        let set = evaluate_all(&s, &answers(&[("count", AnswerValue::Number(2.0))]));
        assert!(set.is_visible("extra"));
        assert!(!set.is_visible("plain"));
    }

    #[test]
    fn test_unknown_operator_fails_open() {
        let mut s = FormSchema::new("k");
        let mut cond = Condition::eq("x", "1");
        cond.operator = ConditionOperator::Unknown("gt".into());
        s.fields = vec![
            FormField::new("x", FieldKind::Number),
            FormField::new("y", FieldKind::Text).with_condition(cond),
        ];
        let set = evaluate_all(&s, &answers(&[("x", AnswerValue::Number(0.0))]));
        assert!(set.is_visible("y"));
    }

    #[test]
    fn test_unknown_reference_hides() {
        let mut s = FormSchema::new("k");
        s.fields = vec![
            FormField::new("y", FieldKind::Text).with_condition(Condition::eq("typo", "yes")),
        ];
        let set = evaluate_all(&s, &answers(&[("typo", AnswerValue::Text("yes".into()))]));
        assert!(!set.is_visible("y"));
    }

    #[test]
    fn test_absent_target() {
        let mut s = FormSchema::new("k");
        let mut eq = Condition::eq("x", "");
        eq.value = None;
        let mut ne = Condition::ne("x", "");
        ne.value = None;
        s.fields = vec![
            FormField::new("x", FieldKind::Text),
            FormField::new("a", FieldKind::Text).with_condition(eq),
            FormField::new("b", FieldKind::Text).with_condition(ne),
        ];
        let set = evaluate_all(&s, &answers(&[("x", AnswerValue::Text(String::new()))]));
        assert!(!set.is_visible("a"));
        assert!(set.is_visible("b"));
    }

    #[test]
    fn test_evaluator_reuses_index() {
        let s = schema();
        let evaluator = VisibilityEvaluator::new(&s);
        let yes = answers(&[("x", AnswerValue::Text("yes".into()))]);
        assert!(evaluator.is_visible(&s.fields[1], &yes));
        assert!(!evaluator.is_visible(&s.fields[2], &yes));
        assert_eq!(evaluator.evaluate(&yes), evaluate_all(&s, &yes));
        assert_eq!(evaluator.evaluate(&AnswerMap::new()).len(), 3);
    }

    #[test]
    fn test_changes() {
        let s = schema();
        let before = evaluate_all(&s, &AnswerMap::new());
        let after = evaluate_all(&s, &answers(&[("x", AnswerValue::Text("yes".into()))]));
        assert!(after.changes(&after).is_empty());
        assert_eq!(before.changes(&after), vec![("y".to_string(), true)]);
        assert_eq!(after.visible().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    fn answer_strategy() -> impl Strategy<Value = AnswerValue> {
        prop_oneof![
            "[a-z]{0,4}".prop_map(AnswerValue::Text),
            any::<bool>().prop_map(AnswerValue::Bool),
            (-5i32..5).prop_map(|n| AnswerValue::Number(f64::from(n))),
        ]
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_idempotent(
            values in proptest::collection::btree_map("[xyz]", answer_strategy(), 0..3)
        ) {
            let s = schema();
            let first = evaluate_all(&s, &values);
            let second = evaluate_all(&s, &values);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_missing_prerequisite_always_hides(own in answer_strategy()) {
            let s = schema();
            let mut values = AnswerMap::new();
            values.insert("y".into(), own);
            prop_assert!(!evaluate_all(&s, &values).is_visible("y"));
        }
    }
}
