use crate::model::task::Task;
use crate::parse::{FIELD_DELIMITER, TIMESTAMP_FORMAT};

/// Encode a task as one persisted line (no trailing newline).
///
/// The description is written verbatim. A description containing the field
/// delimiter produces a line that will not decode again; callers that
/// accept free text should reject it up front (see `contains_delimiter`).
pub fn encode_task(task: &Task) -> String {
    // Tasks are only persisted after the store has assigned an id
    let id = task.id().unwrap_or(0);
    [
        id.to_string(),
        task.description().to_string(),
        task.due_at().format(TIMESTAMP_FORMAT).to_string(),
        task.priority().number().to_string(),
        task.category().tag().to_string(),
    ]
    .join(&FIELD_DELIMITER.to_string())
}

/// Serialize a full snapshot, one line per task, newline-terminated.
pub fn serialize_tasks(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&encode_task(task));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Category, Priority};
    use crate::parse::decode_task;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample(id: u64, desc: &str, category: Category) -> Task {
        let due = NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_hms_opt(8, 15, 42)
            .unwrap();
        Task::restore(id, desc.to_string(), due, Priority::Medium, category)
    }

    #[test]
    fn test_encode_field_order() {
        let task = sample(12, "Book dentist", Category::Personal);
        assert_eq!(
            encode_task(&task),
            "12|Book dentist|2025-11-02T08:15:42|2|PersonalTask"
        );
    }

    #[test]
    fn test_encode_then_decode_is_identity() {
        for (desc, category) in [
            ("Quarterly review", Category::Work),
            ("Pick up groceries: milk, eggs", Category::Personal),
            ("Ünïcödé 📌 task", Category::Work),
        ] {
            let task = sample(3, desc, category);
            assert_eq!(decode_task(&encode_task(&task)).unwrap(), task);
        }
    }

    #[test]
    fn test_serialize_tasks_one_line_each() {
        let tasks = vec![
            sample(1, "First", Category::Work),
            sample(2, "Second", Category::Personal),
        ];
        let out = serialize_tasks(&tasks);
        assert_eq!(
            out,
            "1|First|2025-11-02T08:15:42|2|WorkTask\n2|Second|2025-11-02T08:15:42|2|PersonalTask\n"
        );
        assert_eq!(serialize_tasks(&[]), "");
    }
}
