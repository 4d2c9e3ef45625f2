//! Property tests for the predicate compiler

use proptest::prelude::*;

use crate::compiler::{compile, is_satisfied, Compiler, FieldValue, MemberKind, Record, TypeDescriptor};
use crate::criteria::{Criteria, IntervalType, Value};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::borrow::Cow;

struct Sample {
    count: i64,
    label: String,
    created: NaiveDateTime,
}

impl Record for Sample {
    fn member(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "Count" => Some(FieldValue::Int(self.count)),
            "Label" => Some(FieldValue::Text(Cow::Borrowed(self.label.as_str()))),
            "Created" => Some(FieldValue::DateTime(self.created)),
            _ => None,
        }
    }
}

fn sample_type() -> TypeDescriptor {
    TypeDescriptor::new("Sample")
        .with_member("Count", MemberKind::Integer)
        .with_member("Label", MemberKind::String)
        .with_member("Created", MemberKind::DateTime)
}

fn reference_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

fn sample(count: i64, label: &str, created: NaiveDateTime) -> Sample {
    Sample {
        count,
        label: label.to_string(),
        created,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// In behaves like a disjunction of equalities
    #[test]
    fn prop_in_expansion(
        count in -20..=20i64,
        values in prop::collection::vec(-20..=20i64, 1..=5)
    ) {
        let descriptor = sample_type();
        let record = sample(count, "x", reference_day().and_hms_opt(0, 0, 0).unwrap());

        let in_criteria = Criteria::in_values(
            "Count",
            values.iter().copied().map(Value::Int).collect(),
        ).unwrap();
        let disjunction = values
            .iter()
            .map(|v| Criteria::equal("Count", *v).unwrap())
            .reduce(Criteria::or)
            .unwrap();

        let via_in = compile(&in_criteria, &descriptor).unwrap().evaluate(&record).unwrap();
        let via_or = compile(&disjunction, &descriptor).unwrap().evaluate(&record).unwrap();
        prop_assert_eq!(via_in, via_or);
        prop_assert_eq!(via_in, values.contains(&count));
    }

    /// Between includes both ends
    #[test]
    fn prop_between_inclusive(
        count in -50..=50i64,
        begin in -20..=20i64,
        width in 0..=20i64
    ) {
        let end = begin + width;
        let descriptor = sample_type();
        let record = sample(count, "x", reference_day().and_hms_opt(0, 0, 0).unwrap());
        let criteria = Criteria::between("Count", begin, end).unwrap();

        let result = compile(&criteria, &descriptor).unwrap().evaluate(&record).unwrap();
        prop_assert_eq!(result, begin <= count && count <= end);
    }

    /// Like agrees with the text function it is rewritten to
    #[test]
    fn prop_like_matches_text_functions(
        label in "[a-c]{0,6}",
        needle in "[a-c]{1,3}"
    ) {
        let descriptor = sample_type();
        let record = sample(0, &label, reference_day().and_hms_opt(0, 0, 0).unwrap());
        let check = |c: Criteria| compile(&c, &descriptor).unwrap().evaluate(&record).unwrap();

        prop_assert_eq!(
            check(Criteria::like("Label", format!("%{}%", needle)).unwrap()),
            label.contains(needle.as_str())
        );
        prop_assert_eq!(
            check(Criteria::like("Label", format!("{}%", needle)).unwrap()),
            label.starts_with(needle.as_str())
        );
        prop_assert_eq!(
            check(Criteria::like("Label", format!("%{}", needle)).unwrap()),
            label.ends_with(needle.as_str())
        );
        prop_assert_eq!(
            check(Criteria::like("Label", needle.clone()).unwrap()),
            label == needle
        );
    }

    /// Today matches exactly the reference day
    #[test]
    fn prop_interval_today(offset_minutes in -3000..3000i64) {
        let descriptor = sample_type();
        let midnight = reference_day().and_hms_opt(0, 0, 0).unwrap();
        let created = midnight + Duration::minutes(offset_minutes);
        let record = sample(0, "x", created);

        let predicate = Compiler::new(&descriptor)
            .with_reference_date(reference_day())
            .compile(&Criteria::interval(IntervalType::IntervalToday, "Created").unwrap())
            .unwrap();
        prop_assert_eq!(
            predicate.evaluate(&record).unwrap(),
            created.date() == reference_day()
        );
    }

    /// The single-shot form never fails, whatever the property name
    #[test]
    fn prop_is_satisfied_total(name in "[A-Z][a-z]{0,6}", value in any::<i64>()) {
        let descriptor = sample_type();
        let record = sample(1, "x", reference_day().and_hms_opt(0, 0, 0).unwrap());
        let criteria = Criteria::equal(name, value).unwrap();
        let _ = is_satisfied(&criteria, &descriptor, &record);
    }
}
