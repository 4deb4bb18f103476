use crate::application::use_cases::numeric::{round2, safe_ratio};
use crate::domain::comparison::FieldLengths;
use crate::domain::test_case::{text_len, TestCase};

/// Mean character length per content field; missing fields count as empty.
pub fn average_field_lengths(test_cases: &[TestCase]) -> FieldLengths {
    if test_cases.is_empty() {
        return FieldLengths::default();
    }

    let mut totals = [0usize; 4];
    for case in test_cases {
        totals[0] += text_len(&case.title);
        totals[1] += text_len(&case.precondition);
        totals[2] += text_len(&case.steps);
        totals[3] += text_len(&case.expected_result);
    }

    let count = test_cases.len() as f64;
    let avg = |total: usize| round2(safe_ratio(total as f64, count));

    FieldLengths {
        title: avg(totals[0]),
        precondition: avg(totals[1]),
        steps: avg(totals[2]),
        expected_result: avg(totals[3]),
    }
}
