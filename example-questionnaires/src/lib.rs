pub mod course_feedback;
pub mod quick_check;
pub mod staff_wellbeing;

// Re-export quick_check content
pub use quick_check::{QUICK_CHECK_FORM_ID, quick_check_form, quick_check_questions};

// Re-export staff_wellbeing content
pub use staff_wellbeing::{WELLBEING_FORM_ID, wellbeing_form, wellbeing_questions};

// Re-export course_feedback content
pub use course_feedback::{COURSE_FORM_ID, course_feedback_form, course_feedback_questions};
