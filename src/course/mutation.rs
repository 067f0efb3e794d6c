//! Targeted Mutation Protocol
//!
//! Id-addressed, copy-on-write updates over the course tree. Every function
//! takes the current root and returns the next one:
//!
//! - Only the containers on the path from the root to the target are copied.
//!   Their other children are cloned as `Arc` handles, so untouched subtrees
//!   are the same allocation before and after.
//! - When the target id is not in the tree, or the transform has nothing to
//!   do, the input root is returned (`Arc::ptr_eq` holds).
//!
//! Transforms receive the node as it is *now*, which is what lets two
//! generation results aimed at different nodes land in either order.

use std::sync::Arc;

use super::id::NodeId;
use super::model::{Chapter, Course, ExerciseSet, GeneratedImage, Section, SolverSet};

// =============================================================================
// Core path updates
// =============================================================================

/// Apply a root-level transform; `None` from `f` means "unchanged"
pub fn try_update_course<F>(course: &Arc<Course>, f: F) -> Arc<Course>
where
    F: FnOnce(&Course) -> Option<Course>,
{
    match f(course) {
        Some(next) => Arc::new(next),
        None => Arc::clone(course),
    }
}

/// Replace the root with `f(root)`
pub fn update_course<F>(course: &Arc<Course>, f: F) -> Arc<Course>
where
    F: FnOnce(&Course) -> Course,
{
    try_update_course(course, |current| Some(f(current)))
}

/// Replace the chapter `chapter_id` with `f(chapter)` if `f` returns `Some`
pub fn try_update_chapter<F>(course: &Arc<Course>, chapter_id: &NodeId, f: F) -> Arc<Course>
where
    F: FnOnce(&Chapter) -> Option<Chapter>,
{
    let Some(idx) = course.chapters.iter().position(|c| &c.id == chapter_id) else {
        return Arc::clone(course);
    };
    let Some(chapter) = f(&course.chapters[idx]) else {
        return Arc::clone(course);
    };

    let mut next = Course::clone(course);
    next.chapters[idx] = Arc::new(chapter);
    Arc::new(next)
}

/// Replace the chapter `chapter_id` with `f(chapter)`; no-op when absent
pub fn update_chapter<F>(course: &Arc<Course>, chapter_id: &NodeId, f: F) -> Arc<Course>
where
    F: FnOnce(&Chapter) -> Chapter,
{
    try_update_chapter(course, chapter_id, |chapter| Some(f(chapter)))
}

/// Replace one section of one chapter if `f` returns `Some`
pub fn try_update_section<F>(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    section_id: &NodeId,
    f: F,
) -> Arc<Course>
where
    F: FnOnce(&Section) -> Option<Section>,
{
    try_update_chapter(course, chapter_id, |chapter| {
        let idx = chapter.sections.iter().position(|s| &s.id == section_id)?;
        let section = f(&chapter.sections[idx])?;

        let mut next = chapter.clone();
        next.sections[idx] = Arc::new(section);
        Some(next)
    })
}

/// Replace one section of one chapter with `f(section)`; no-op when either is absent
pub fn update_section<F>(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    section_id: &NodeId,
    f: F,
) -> Arc<Course>
where
    F: FnOnce(&Section) -> Section,
{
    try_update_section(course, chapter_id, section_id, |section| Some(f(section)))
}

// =============================================================================
// Appends
// =============================================================================

pub fn append_exercise_set(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    set: ExerciseSet,
) -> Arc<Course> {
    update_chapter(course, chapter_id, |chapter| {
        let mut next = chapter.clone();
        next.exercise_sets.push(Arc::new(set));
        next
    })
}

pub fn append_solver_set(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    set: SolverSet,
) -> Arc<Course> {
    update_chapter(course, chapter_id, |chapter| {
        let mut next = chapter.clone();
        next.solver_sets.push(Arc::new(set));
        next
    })
}

pub fn append_image(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    section_id: &NodeId,
    image: GeneratedImage,
) -> Arc<Course> {
    update_section(course, chapter_id, section_id, |section| {
        let mut next = section.clone();
        next.images.push(Arc::new(image));
        next
    })
}

pub fn append_exam_set(course: &Arc<Course>, set: ExerciseSet) -> Arc<Course> {
    try_update_course(course, |current| {
        let mut next = current.clone();
        next.exam_sets.push(Arc::new(set));
        Some(next)
    })
}

/// Append chapters at the end of the course; an empty batch is a no-op
pub fn append_chapters(course: &Arc<Course>, chapters: Vec<Chapter>) -> Arc<Course> {
    try_update_course(course, |current| {
        if chapters.is_empty() {
            return None;
        }
        let mut next = current.clone();
        next.chapters.extend(chapters.into_iter().map(Arc::new));
        Some(next)
    })
}

// =============================================================================
// Removals
// =============================================================================

/// Remove the first element whose id matches, or `None` if nothing matched
fn without_id<T>(
    items: &[Arc<T>],
    id: &NodeId,
    id_of: impl Fn(&T) -> &NodeId,
) -> Option<Vec<Arc<T>>> {
    let idx = items.iter().position(|item| id_of(&**item) == id)?;
    let mut next = items.to_vec();
    next.remove(idx);
    Some(next)
}

pub fn remove_exercise_set(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    set_id: &NodeId,
) -> Arc<Course> {
    try_update_chapter(course, chapter_id, |chapter| {
        let exercise_sets = without_id(&chapter.exercise_sets, set_id, |s| &s.id)?;
        Some(Chapter {
            exercise_sets,
            ..chapter.clone()
        })
    })
}

pub fn remove_solver_set(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    set_id: &NodeId,
) -> Arc<Course> {
    try_update_chapter(course, chapter_id, |chapter| {
        let solver_sets = without_id(&chapter.solver_sets, set_id, |s| &s.id)?;
        Some(Chapter {
            solver_sets,
            ..chapter.clone()
        })
    })
}

pub fn remove_exam_set(course: &Arc<Course>, set_id: &NodeId) -> Arc<Course> {
    try_update_course(course, |current| {
        let exam_sets = without_id(&current.exam_sets, set_id, |s| &s.id)?;
        Some(Course {
            exam_sets,
            ..current.clone()
        })
    })
}

// =============================================================================
// Section content
// =============================================================================

/// First fill of a section's content; a section that already has content is left alone
pub fn set_section_content(
    course: &Arc<Course>,
    chapter_id: &NodeId,
    section_id: &NodeId,
    content: String,
) -> Arc<Course> {
    try_update_section(course, chapter_id, section_id, |section| {
        if section.has_content() {
            return None;
        }
        Some(Section {
            content: Some(content),
            ..section.clone()
        })
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::model::{Exercise, ExercisePart, SolverInput};
    use proptest::prelude::*;

    fn course_with(shape: &[usize]) -> Arc<Course> {
        let chapters = shape
            .iter()
            .enumerate()
            .map(|(i, &sections)| {
                Chapter::new(
                    format!("Chapter {}", i + 1),
                    (0..sections).map(|j| format!("Section {}.{}", i + 1, j + 1)),
                )
            })
            .collect();
        Arc::new(Course::new("Course", chapters))
    }

    fn solver_set(text: &str) -> SolverSet {
        SolverSet::new(SolverInput::text(text), "solution")
    }

    fn exercise_set(focus: &str, exercises: usize, parts: usize) -> ExerciseSet {
        let exercises = (0..exercises)
            .map(|i| Exercise {
                problem: format!("Problem {}", i + 1),
                parts: (0..parts)
                    .map(|p| ExercisePart {
                        part: format!("Part {}", p + 1),
                        solution: format!("Solution {}", p + 1),
                    })
                    .collect(),
            })
            .collect();
        ExerciseSet::new(Some(focus.to_string()), exercises)
    }

    fn shape() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..4, 1..6)
    }

    proptest! {
        #[test]
        fn prop_absent_chapter_is_noop(shape in shape()) {
            let course = course_with(&shape);
            let missing = NodeId::new();
            let next = update_chapter(&course, &missing, |c| Chapter {
                title: "changed".to_string(),
                ..c.clone()
            });
            prop_assert!(Arc::ptr_eq(&course, &next));
        }

        #[test]
        fn prop_update_chapter_shares_siblings(
            shape in shape(),
            pick in any::<prop::sample::Index>(),
        ) {
            let course = course_with(&shape);
            let target = pick.index(course.chapters.len());
            let target_id = course.chapters[target].id.clone();

            let next = update_chapter(&course, &target_id, |c| Chapter {
                title: format!("{} (revised)", c.title),
                ..c.clone()
            });

            prop_assert!(!Arc::ptr_eq(&course, &next));
            prop_assert_eq!(next.chapters.len(), course.chapters.len());
            for (i, (before, after)) in course.chapters.iter().zip(&next.chapters).enumerate() {
                if i == target {
                    prop_assert!(!Arc::ptr_eq(before, after));
                    prop_assert!(after.title.ends_with("(revised)"));
                    for (s0, s1) in before.sections.iter().zip(&after.sections) {
                        prop_assert!(Arc::ptr_eq(s0, s1));
                    }
                } else {
                    prop_assert!(Arc::ptr_eq(before, after));
                }
            }
        }

        #[test]
        fn prop_append_preserves_prior_elements(
            shape in shape(),
            pick in any::<prop::sample::Index>(),
            appends in 1usize..5,
        ) {
            let mut course = course_with(&shape);
            let target = pick.index(course.chapters.len());
            let chapter_id = course.chapters[target].id.clone();
            let section_id = course.chapters[target].sections[0].id.clone();

            for n in 0..appends {
                let previous = Arc::clone(&course);
                let before = Arc::clone(&course.chapters[target]);
                let focus = Some(format!("f{}", n));
                course = append_solver_set(&course, &chapter_id, solver_set(&format!("q{}", n)));
                course = append_image(
                    &course,
                    &chapter_id,
                    &section_id,
                    GeneratedImage::new("data", format!("p{}", n)),
                );
                course = append_exercise_set(
                    &course,
                    &chapter_id,
                    ExerciseSet::new(focus.clone(), vec![]),
                );
                course = append_exam_set(&course, ExerciseSet::new(focus.clone(), vec![]));
                let after = &course.chapters[target];

                prop_assert_eq!(after.solver_sets.len(), before.solver_sets.len() + 1);
                for (old, new) in before.solver_sets.iter().zip(&after.solver_sets) {
                    prop_assert!(Arc::ptr_eq(old, new));
                }

                let old_images = &before.sections[0].images;
                let new_images = &after.sections[0].images;
                prop_assert_eq!(new_images.len(), old_images.len() + 1);
                for (old, new) in old_images.iter().zip(new_images) {
                    prop_assert!(Arc::ptr_eq(old, new));
                }
                prop_assert_eq!(&new_images.last().unwrap().prompt, &format!("p{}", n));

                prop_assert_eq!(after.exercise_sets.len(), before.exercise_sets.len() + 1);
                for (old, new) in before.exercise_sets.iter().zip(&after.exercise_sets) {
                    prop_assert!(Arc::ptr_eq(old, new));
                }
                prop_assert_eq!(&after.exercise_sets.last().unwrap().focused_idea, &focus);

                prop_assert_eq!(course.exam_sets.len(), previous.exam_sets.len() + 1);
                for (old, new) in previous.exam_sets.iter().zip(&course.exam_sets) {
                    prop_assert!(Arc::ptr_eq(old, new));
                }
                prop_assert_eq!(&course.exam_sets.last().unwrap().focused_idea, &focus);
            }
        }
    }

    #[test]
    fn test_absent_section_is_noop() {
        let course = course_with(&[2, 1]);
        let chapter_id = course.chapters[0].id.clone();
        let foreign_section = course.chapters[1].sections[0].id.clone();

        let next = update_section(&course, &chapter_id, &foreign_section, |s| Section {
            title: "changed".to_string(),
            ..s.clone()
        });
        assert!(Arc::ptr_eq(&course, &next));
    }

    #[test]
    fn test_update_section_shares_other_sections() {
        let course = course_with(&[3]);
        let chapter_id = course.chapters[0].id.clone();
        let section_id = course.chapters[0].sections[1].id.clone();

        let next = update_section(&course, &chapter_id, &section_id, |s| Section {
            title: "Renamed".to_string(),
            ..s.clone()
        });

        let (old, new) = (&course.chapters[0].sections, &next.chapters[0].sections);
        assert!(Arc::ptr_eq(&old[0], &new[0]));
        assert!(!Arc::ptr_eq(&old[1], &new[1]));
        assert!(Arc::ptr_eq(&old[2], &new[2]));
        assert_eq!(new[1].title, "Renamed");
    }

    #[test]
    fn test_append_exercise_set_three_by_four() {
        let course = course_with(&[1, 1]);
        let chapter_id = course.chapters[1].id.clone();

        let next = append_exercise_set(&course, &chapter_id, exercise_set("derivatives", 3, 4));

        let sets = &next.chapters[1].exercise_sets;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].focused_idea.as_deref(), Some("derivatives"));
        assert_eq!(sets[0].exercises.len(), 3);
        assert!(sets[0].exercises.iter().all(|e| e.parts.len() == 4));
        assert!(Arc::ptr_eq(&course.chapters[0], &next.chapters[0]));
    }

    #[test]
    fn test_remove_solver_set_unknown_id_is_noop() {
        let course = course_with(&[1]);
        let chapter_id = course.chapters[0].id.clone();
        let course = append_solver_set(&course, &chapter_id, solver_set("a"));
        let course = append_solver_set(&course, &chapter_id, solver_set("b"));

        let next = remove_solver_set(&course, &chapter_id, &NodeId::new());
        assert!(Arc::ptr_eq(&course, &next));
        assert_eq!(next.chapters[0].solver_sets.len(), 2);
    }

    #[test]
    fn test_remove_removes_exactly_one() {
        let course = course_with(&[1]);
        let chapter_id = course.chapters[0].id.clone();
        let mut duplicate = exercise_set("x", 1, 1);
        let dup_id = duplicate.id.clone();
        let course = append_exercise_set(&course, &chapter_id, duplicate.clone());
        duplicate.focused_idea = Some("y".to_string());
        let course = append_exercise_set(&course, &chapter_id, duplicate);

        let next = remove_exercise_set(&course, &chapter_id, &dup_id);
        let sets = &next.chapters[0].exercise_sets;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].focused_idea.as_deref(), Some("y"));
    }

    #[test]
    fn test_exam_sets_append_and_remove() {
        let course = course_with(&[1]);
        let first = exercise_set("limits", 2, 1);
        let first_id = first.id.clone();
        let course = append_exam_set(&course, first);
        let course = append_exam_set(&course, exercise_set("series", 1, 1));
        assert_eq!(course.exam_sets.len(), 2);

        let next = remove_exam_set(&course, &first_id);
        assert_eq!(next.exam_sets.len(), 1);
        assert_eq!(next.exam_sets[0].focused_idea.as_deref(), Some("series"));
        assert!(Arc::ptr_eq(&course.chapters[0], &next.chapters[0]));

        let unchanged = remove_exam_set(&next, &first_id);
        assert!(Arc::ptr_eq(&next, &unchanged));
    }

    #[test]
    fn test_set_section_content_fills_once() {
        let course = course_with(&[1]);
        let chapter_id = course.chapters[0].id.clone();
        let section_id = course.chapters[0].sections[0].id.clone();

        let filled = set_section_content(&course, &chapter_id, &section_id, "# First".to_string());
        let section = filled.section(&chapter_id, &section_id).unwrap();
        assert_eq!(section.content.as_deref(), Some("# First"));
        assert!(section.images.is_empty());

        let again = set_section_content(&filled, &chapter_id, &section_id, "# Second".to_string());
        assert!(Arc::ptr_eq(&filled, &again));
    }

    #[test]
    fn test_out_of_order_results_on_different_nodes_commute() {
        let course = course_with(&[1, 1]);
        let a = course.chapters[0].id.clone();
        let b = course.chapters[1].id.clone();

        let ab = append_solver_set(&course, &a, solver_set("a"));
        let ab = append_solver_set(&ab, &b, solver_set("b"));
        let ba = append_solver_set(&course, &b, solver_set("b"));
        let ba = append_solver_set(&ba, &a, solver_set("a"));

        for course in [ab, ba] {
            assert_eq!(course.chapters[0].solver_sets[0].user_input.content, "a");
            assert_eq!(course.chapters[1].solver_sets[0].user_input.content, "b");
        }
    }

    #[test]
    fn test_append_chapters() {
        let course = course_with(&[1]);
        let unchanged = append_chapters(&course, Vec::new());
        assert!(Arc::ptr_eq(&course, &unchanged));

        let next = append_chapters(&course, vec![Chapter::new("Vectors", ["Vectors"])]);
        assert_eq!(next.chapters.len(), 2);
        assert!(Arc::ptr_eq(&course.chapters[0], &next.chapters[0]));
        assert_eq!(next.chapters[1].title, "Vectors");
    }
}
