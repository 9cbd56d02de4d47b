//! Question detection for the L3 index

use crate::memory::types::{Role, Turn};

const QUESTION_MARKS: [char; 2] = ['?', '？'];

/// Whether `text` reads as a question
///
/// True when it contains an ASCII or full-width question mark, or any of
/// the configured question particles.
pub fn is_question_like(text: &str, particles: &[String]) -> bool {
    text.contains(QUESTION_MARKS)
        || particles
            .iter()
            .any(|p| !p.is_empty() && text.contains(p.as_str()))
}

/// Whether a turn belongs in the question index
pub fn is_indexable_question(turn: &Turn, particles: &[String]) -> bool {
    match turn.role() {
        Role::Secondary => is_question_like(turn.text(), particles),
        Role::Primary | Role::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles() -> Vec<String> {
        vec!["吗".to_string(), "呢".to_string()]
    }

    #[test]
    fn ascii_question_mark() {
        assert!(is_question_like("what is this?", &particles()));
    }

    #[test]
    fn full_width_question_mark() {
        assert!(is_question_like("这是什么？", &particles()));
    }

    #[test]
    fn question_particle_without_mark() {
        assert!(is_question_like("你听懂了吗", &particles()));
        assert!(is_question_like("然后呢", &particles()));
    }

    #[test]
    fn plain_statement() {
        assert!(!is_question_like("please explain more now", &particles()));
        assert!(!is_question_like("你听懂了吗", &[]));
    }

    #[test]
    fn empty_particles_are_ignored() {
        assert!(!is_question_like("statement", &[String::new()]));
    }

    #[test]
    fn only_student_turns_are_indexed() {
        let student = Turn::new(Role::Secondary, "why?", 1);
        let teacher = Turn::new(Role::Primary, "any questions?", 2);
        let unknown = Turn::new(Role::Unknown, "huh?", 1);

        assert!(is_indexable_question(&student, &particles()));
        assert!(!is_indexable_question(&teacher, &particles()));
        assert!(!is_indexable_question(&unknown, &particles()));
    }
}
