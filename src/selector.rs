//! Random workout selection.
//!
//! [`select_workout`] is the only algorithmic part of the application. Both
//! the desktop table and the browser view go through [`generate`], which
//! applies the user's filters before handing the remaining exercises to the
//! selector.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::catalog::{Catalog, ExerciseFilter, ExerciseRecord, distinct_names, filter_records};
use crate::error::{CatalogError, SelectError, WorkoutError};

/// Exercise counts offered in the user interface.
pub const COUNT_OPTIONS: [usize; 6] = [3, 4, 5, 6, 7, 8];

/// Default number of exercises per workout.
pub const DEFAULT_COUNT: usize = 5;

/// Ordered exercises selected for one workout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutPlan {
    pub exercises: Vec<ExerciseRecord>,
    /// Number of leading exercises admitted with distinct muscle groups.
    /// Anything after this index was added by fallback fill.
    pub primary_len: usize,
}

impl WorkoutPlan {
    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Exercises added without the muscle group constraint.
    pub fn fallback(&self) -> &[ExerciseRecord] {
        self.exercises.get(self.primary_len..).unwrap_or(&[])
    }
}

/// Pick up to `count` exercises from `catalog`.
///
/// The catalog is shuffled and scanned once; an exercise is taken when
/// neither its name nor its muscle group has been taken before. If that scan
/// ends short, the plan is topped up with a random sample of the exercises
/// whose names are still unused, this time ignoring muscle groups.
///
/// Names are never repeated, so the plan holds
/// `min(count, distinct names in catalog)` exercises.
pub fn select_workout<R: Rng + ?Sized>(
    catalog: &[ExerciseRecord],
    count: usize,
    rng: &mut R,
) -> Result<WorkoutPlan, SelectError> {
    if catalog.is_empty() {
        return Err(SelectError::EmptyCatalog);
    }
    if count == 0 {
        return Err(SelectError::InvalidCount(count));
    }

    let mut shuffled: Vec<&ExerciseRecord> = catalog.iter().collect();
    shuffled.shuffle(rng);

    let mut exercises: Vec<ExerciseRecord> = Vec::with_capacity(count);
    let mut used_names: HashSet<&str> = HashSet::new();
    let mut used_muscles: HashSet<&str> = HashSet::new();

    for ex in shuffled {
        if exercises.len() >= count {
            break;
        }
        if used_names.contains(ex.name.as_str()) || used_muscles.contains(ex.muscle_group.as_str())
        {
            continue;
        }
        log::trace!("Admitting {} ({})", ex.name, ex.muscle_group);
        used_names.insert(&ex.name);
        used_muscles.insert(&ex.muscle_group);
        exercises.push(ex.clone());
    }
    let primary_len = exercises.len();

    if exercises.len() < count {
        // Shuffle before keeping one row per unused name, so every row of a
        // duplicated name can be drawn and no slot is wasted on a repeat.
        let mut remaining: Vec<&ExerciseRecord> = catalog
            .iter()
            .filter(|ex| !used_names.contains(ex.name.as_str()))
            .collect();
        remaining.shuffle(rng);
        let mut seen: HashSet<&str> = HashSet::new();
        remaining.retain(|ex| seen.insert(&ex.name));
        if !remaining.is_empty() {
            let wanted = (count - exercises.len()).min(remaining.len());
            remaining.truncate(wanted);
            log::debug!(
                "Muscle groups exhausted after {} exercises, filling {} more",
                primary_len,
                wanted
            );
            for ex in remaining {
                if exercises.len() >= count {
                    break;
                }
                if used_names.insert(&ex.name) {
                    exercises.push(ex.clone());
                }
            }
        }
    }

    Ok(WorkoutPlan {
        exercises,
        primary_len,
    })
}

/// Filter the catalog and select a workout from what is left.
pub fn generate<R: Rng + ?Sized>(
    catalog: &Catalog,
    filter: &ExerciseFilter,
    count: usize,
    rng: &mut R,
) -> Result<WorkoutPlan, WorkoutError> {
    if catalog.records.is_empty() {
        return Err(CatalogError::Empty.into());
    }
    if filter.is_incomplete() {
        return Err(CatalogError::NothingSelected.into());
    }
    let filtered = filter_records(catalog, filter);
    if filtered.is_empty() {
        return Err(CatalogError::EmptyFilterResult.into());
    }
    if count == 0 {
        return Err(SelectError::InvalidCount(count).into());
    }
    let plan = select_workout(&filtered, count, rng)?;
    log::info!(
        "Generated workout with {} of {} requested exercises from {} candidates",
        plan.len(),
        count,
        distinct_names(&filtered)
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnMap;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record(name: &str, muscle: &str) -> ExerciseRecord {
        ExerciseRecord {
            name: name.into(),
            muscle_group: muscle.into(),
            difficulty: "Easy".into(),
            equipment: "TRX".into(),
            link: None,
            extra: Vec::new(),
        }
    }

    fn unique_names(plan: &WorkoutPlan) -> bool {
        let names: HashSet<&str> = plan.exercises.iter().map(|e| e.name.as_str()).collect();
        names.len() == plan.len()
    }

    fn primary_muscles_unique(plan: &WorkoutPlan) -> bool {
        let muscles: HashSet<&str> = plan.exercises[..plan.primary_len]
            .iter()
            .map(|e| e.muscle_group.as_str())
            .collect();
        muscles.len() == plan.primary_len
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            select_workout(&[], 3, &mut rng),
            Err(SelectError::EmptyCatalog)
        );
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = vec![record("Row", "Back")];
        assert_eq!(
            select_workout(&catalog, 0, &mut rng),
            Err(SelectError::InvalidCount(0))
        );
    }

    #[test]
    fn one_exercise_per_muscle_group() {
        let catalog = vec![
            record("A1", "A"),
            record("A2", "A"),
            record("B1", "B"),
            record("B2", "B"),
            record("C1", "C"),
        ];
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = select_workout(&catalog, 3, &mut rng).unwrap();
            assert_eq!(plan.len(), 3);
            assert_eq!(plan.primary_len, 3);
            assert!(unique_names(&plan));
            let mut muscles: Vec<&str> = plan
                .exercises
                .iter()
                .map(|e| e.muscle_group.as_str())
                .collect();
            muscles.sort();
            assert_eq!(muscles, vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn small_catalog_returns_everything() {
        let catalog = vec![record("Row", "Back"), record("Plank", "Core")];
        let mut rng = StdRng::seed_from_u64(7);
        let plan = select_workout(&catalog, 5, &mut rng).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.primary_len, 2);
        assert!(plan.fallback().is_empty());
    }

    #[test]
    fn fallback_fills_single_muscle_group() {
        let catalog: Vec<ExerciseRecord> = (1..=6)
            .map(|i| record(&format!("Curl {i}"), "Biceps"))
            .collect();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = select_workout(&catalog, 4, &mut rng).unwrap();
            assert_eq!(plan.primary_len, 1);
            assert_eq!(plan.fallback().len(), 3);
            assert_eq!(plan.len(), 4);
            assert!(unique_names(&plan));
        }
    }

    #[test]
    fn fallback_skips_duplicate_names() {
        let catalog = vec![
            record("Squat", "Legs"),
            record("Squat", "Glutes"),
            record("Lunge", "Legs"),
            record("Lunge", "Legs"),
            record("Bridge", "Glutes"),
        ];
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = select_workout(&catalog, 5, &mut rng).unwrap();
            assert_eq!(plan.len(), 3);
            assert!(unique_names(&plan));
            assert!(primary_muscles_unique(&plan));
        }
    }

    #[test]
    fn fallback_draws_any_row_of_a_duplicated_name() {
        let mut first = record("Lunge", "Legs");
        first.link = Some("https://example.com/lunge-1".into());
        let mut second = record("Lunge", "Legs");
        second.link = Some("https://example.com/lunge-2".into());
        let catalog = vec![record("Squat", "Legs"), first, second];
        let mut drawn: HashSet<String> = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = select_workout(&catalog, 2, &mut rng).unwrap();
            assert_eq!(plan.len(), 2);
            assert_eq!(plan.primary_len, 1);
            assert!(unique_names(&plan));
            for ex in plan.fallback() {
                if let Some(link) = &ex.link {
                    drawn.insert(link.clone());
                }
            }
        }
        assert!(drawn.contains("https://example.com/lunge-1"));
        assert!(drawn.contains("https://example.com/lunge-2"));
    }

    #[test]
    fn fallback_is_empty_when_primary_len_overshoots() {
        let plan = WorkoutPlan {
            exercises: vec![record("Row", "Back")],
            primary_len: 5,
        };
        assert!(plan.fallback().is_empty());
        assert!(WorkoutPlan::default().fallback().is_empty());
    }

    #[test]
    fn link_does_not_affect_selection() {
        let mut odd = record("Dip", "Triceps");
        odd.link = Some("not-a-url".into());
        let catalog = vec![odd, record("Row", "Back")];
        let mut rng = StdRng::seed_from_u64(3);
        let plan = select_workout(&catalog, 2, &mut rng).unwrap();
        let dip = plan.exercises.iter().find(|e| e.name == "Dip").unwrap();
        assert_eq!(dip.guide_url(), None);
    }

    #[test]
    fn same_seed_same_plan() {
        let catalog: Vec<ExerciseRecord> = (0..20)
            .map(|i| record(&format!("E{i}"), &format!("M{}", i % 4)))
            .collect();
        let a = select_workout(&catalog, 6, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = select_workout(&catalog, 6, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.primary_len, 4);
    }

    #[test]
    fn length_and_diversity_over_many_catalogs() {
        let mut rng = StdRng::seed_from_u64(2024);
        for size in 1..15 {
            for groups in 1..6 {
                let catalog: Vec<ExerciseRecord> = (0..size)
                    .map(|i| record(&format!("E{}", i % 11), &format!("M{}", i % groups)))
                    .collect();
                let distinct_groups = groups.min(size);
                for count in 1..10 {
                    let plan = select_workout(&catalog, count, &mut rng).unwrap();
                    assert_eq!(plan.len(), count.min(distinct_names(&catalog)));
                    assert!(unique_names(&plan));
                    assert!(primary_muscles_unique(&plan));
                    if distinct_groups >= count {
                        assert!(plan.fallback().is_empty());
                    }
                }
            }
        }
    }

    fn catalog_with_filters() -> Catalog {
        let mut easy = record("Row", "Back");
        easy.difficulty = "Easy".into();
        let mut hard = record("Pistol", "Legs");
        hard.difficulty = "Hard".into();
        Catalog {
            columns: ColumnMap {
                name: 0,
                muscle_group: 1,
                difficulty: Some(2),
                equipment: Some(3),
                link: None,
            },
            extra_headers: Vec::new(),
            records: vec![easy, hard],
        }
    }

    fn filter(difficulties: &[&str], equipment: &[&str]) -> ExerciseFilter {
        ExerciseFilter {
            difficulties: difficulties.iter().map(|s| s.to_string()).collect(),
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn generate_applies_filters() {
        let catalog = catalog_with_filters();
        let mut rng = StdRng::seed_from_u64(5);
        let plan = generate(&catalog, &filter(&["Hard"], &["TRX"]), 3, &mut rng).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.exercises[0].name, "Pistol");
    }

    #[test]
    fn generate_reports_empty_filter_result() {
        let catalog = catalog_with_filters();
        let mut rng = StdRng::seed_from_u64(5);
        let err = generate(&catalog, &filter(&["Medium"], &["TRX"]), 3, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            WorkoutError::Catalog(CatalogError::EmptyFilterResult)
        ));
    }

    #[test]
    fn generate_reports_empty_catalog() {
        let catalog = crate::catalog::parse_catalog("Name,Muscle\n".as_bytes()).unwrap();
        assert!(catalog.records.is_empty());
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate(&catalog, &filter(&["Easy"], &["TRX"]), 3, &mut rng).unwrap_err();
        assert!(matches!(err, WorkoutError::Catalog(CatalogError::Empty)));
        assert_eq!(err.severity(), crate::error::Severity::Warning);
        // An empty catalog wins over an incomplete selection.
        let err = generate(&catalog, &filter(&[], &[]), 3, &mut rng).unwrap_err();
        assert!(matches!(err, WorkoutError::Catalog(CatalogError::Empty)));
    }

    #[test]
    fn generate_requires_a_selection() {
        let catalog = catalog_with_filters();
        let mut rng = StdRng::seed_from_u64(5);
        let err = generate(&catalog, &filter(&["Easy"], &[]), 3, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            WorkoutError::Catalog(CatalogError::NothingSelected)
        ));
    }

    #[test]
    fn generate_guards_count() {
        let catalog = catalog_with_filters();
        let mut rng = StdRng::seed_from_u64(5);
        let err = generate(&catalog, &filter(&["Easy"], &["TRX"]), 0, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            WorkoutError::Select(SelectError::InvalidCount(0))
        ));
    }
}
