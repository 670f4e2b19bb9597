use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeMap;
use students_marks::Database;
use students_marks::config::AppConfig;
use students_marks::students::{Mark, Student, StudentsService, StudentsServiceImpl};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(day))
}

fn load(roster: &BTreeMap<i64, Vec<i32>>) -> StudentsServiceImpl {
    let svc = Database::in_memory().students_service(&AppConfig::default()).unwrap();
    for (id, scores) in roster {
        svc.add_student(&Student::new(*id, format!("05{id}"))).unwrap();
        for (day, score) in scores.iter().enumerate() {
            svc.add_mark(*id, &Mark::new("Math", *score, date(u32::try_from(day).unwrap()))).unwrap();
        }
    }
    svc
}

fn roster() -> impl Strategy<Value = BTreeMap<i64, Vec<i32>>> {
    proptest::collection::btree_map(0i64..40, proptest::collection::vec(0i32..=100, 0..6), 0..15)
}

proptest! {
    #[test]
    fn marks_come_back_in_append_order(scores in proptest::collection::vec(0i32..=100, 0..20)) {
        let mut roster = BTreeMap::new();
        roster.insert(1, scores.clone());
        let svc = load(&roster);
        let got: Vec<i32> = svc.get_marks(1).unwrap().iter().map(|m| m.score).collect();
        prop_assert_eq!(got, scores);
    }

    #[test]
    fn worst_matches_brute_force(roster in roster(), n in 0usize..20) {
        let svc = load(&roster);
        let mut expected: Vec<(i64, i64)> =
            roster.iter().map(|(id, s)| (s.iter().map(|v| i64::from(*v)).sum(), *id)).collect();
        expected.sort_unstable();
        let expected: Vec<i64> = expected.into_iter().take(n).map(|(_, id)| id).collect();
        prop_assert_eq!(svc.get_worst_students(n).unwrap(), expected);
    }

    #[test]
    fn best_matches_brute_force(roster in roster(), n in 0usize..20) {
        let svc = load(&roster);
        let mut expected: Vec<(std::cmp::Reverse<usize>, i64)> = roster
            .iter()
            .map(|(id, s)| (std::cmp::Reverse(s.iter().filter(|v| **v > 80).count()), *id))
            .filter(|(std::cmp::Reverse(c), _)| *c > 0)
            .collect();
        expected.sort_unstable();
        let expected: Vec<i64> = expected.into_iter().take(n).map(|(_, id)| id).collect();
        prop_assert_eq!(svc.get_best_students(n).unwrap(), expected);
    }

    #[test]
    fn few_marks_matches_brute_force(roster in roster(), n in 0usize..8) {
        let svc = load(&roster);
        let expected: Vec<i64> = roster.iter().filter(|(_, s)| s.len() < n).map(|(id, _)| *id).collect();
        let got: Vec<i64> = svc.get_students_few_marks(n).unwrap().iter().map(|s| s.id).collect();
        prop_assert_eq!(got, expected);
    }
}
