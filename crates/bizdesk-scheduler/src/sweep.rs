//! Scheduler sweep: advances every due recurring task in one pass.
//! The sweep is pull-based: nothing runs until a caller asks for it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use bizdesk_core::TaskStatus;

use crate::store::TaskStore;
use crate::tasks::now_millis;

impl TaskStore {
    /// Sweep at the current time. Returns the ids of advanced tasks.
    pub fn run_sweep(&self) -> Vec<String> {
        self.run_sweep_at(now_millis())
    }

    /// Sweep at `now`: every recurring task with `next_run_at <= now` gets
    /// `last_run_at = now`, `next_run_at = now + interval`, and a completed
    /// status reopened to pending. The whole pass holds the write lock.
    pub fn run_sweep_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut table = self.write();
        let mut advanced = Vec::new();

        for task in table.tasks.values_mut() {
            if !task.is_due(now) {
                continue;
            }
            task.mark_run(now);
            if task.status == TaskStatus::Completed {
                task.status = TaskStatus::Pending;
            }
            tracing::info!("🔔 Recurring task advanced: '{}' ({})", task.title, task.id);
            advanced.push(task.id.clone());
        }
        drop(table);

        if advanced.is_empty() {
            tracing::debug!("Sweep found no due tasks");
        } else {
            tracing::info!("⏰ Sweep advanced {} recurring task(s)", advanced.len());
        }
        advanced
    }
}

/// Call [`TaskStore::run_sweep`] every `every_secs` seconds.
/// An external trigger for deployments without an outside cron caller.
pub async fn spawn_sweeper(store: Arc<TaskStore>, every_secs: u64) {
    tracing::info!("⏰ Sweeper started (every {}s)", every_secs);

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(every_secs.max(1)));
    loop {
        interval.tick().await;
        let advanced = store.run_sweep();
        for id in &advanced {
            tracing::debug!("📣 swept {}", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskFilter;
    use crate::tasks::{NewTask, TaskUpdate};
    use chrono::Duration;

    #[test]
    fn test_due_completed_task_reopens() {
        let store = TaskStore::new();
        let task = store
            .add_task(NewTask::new("ops", "Checklist").recurring(30).status(TaskStatus::Completed))
            .unwrap();

        let now = task.created_at + Duration::minutes(31);
        let advanced = store.run_sweep_at(now);
        assert_eq!(advanced, vec![task.id.clone()]);

        let swept = store.get_task(&task.id).unwrap();
        assert_eq!(swept.status, TaskStatus::Pending);
        assert_eq!(swept.last_run_at, Some(now));
        assert_eq!(swept.next_run_at, Some(now + Duration::minutes(30)));
        assert_eq!(swept.updated_at, now);
    }

    #[test]
    fn test_due_exactly_at_next_run() {
        let store = TaskStore::new();
        let task = store.add_task(NewTask::new("ops", "Checklist").recurring(10)).unwrap();
        let now = task.next_run_at.unwrap();
        assert_eq!(store.run_sweep_at(now), vec![task.id]);
    }

    #[test]
    fn test_not_due_untouched() {
        let store = TaskStore::new();
        let task = store
            .add_task(NewTask::new("ops", "Checklist").recurring(30).status(TaskStatus::Completed))
            .unwrap();

        let now = task.created_at + Duration::minutes(29);
        assert!(store.run_sweep_at(now).is_empty());
        assert_eq!(store.get_task(&task.id).unwrap(), task);
    }

    #[test]
    fn test_non_completed_status_kept() {
        let store = TaskStore::new();
        let task = store
            .add_task(NewTask::new("ops", "Checklist").recurring(5).status(TaskStatus::NeedsReview))
            .unwrap();
        store.run_sweep_at(task.created_at + Duration::hours(1));
        assert_eq!(store.get_task(&task.id).unwrap().status, TaskStatus::NeedsReview);
    }

    #[test]
    fn test_non_recurring_ignored() {
        let store = TaskStore::new();
        let task = store
            .add_task(NewTask::new("hr", "One-off").status(TaskStatus::Completed))
            .unwrap();
        assert!(store.run_sweep_at(task.created_at + Duration::days(2)).is_empty());
        assert_eq!(store.get_task(&task.id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_mixed_batch_and_repeat_sweep() {
        let store = TaskStore::new();
        let fast = store.add_task(NewTask::new("ops", "Fast").recurring(5)).unwrap();
        let slow = store.add_task(NewTask::new("ops", "Slow").recurring(120)).unwrap();
        store.add_task(NewTask::new("hr", "Plain")).unwrap();

        let now = fast.created_at + Duration::minutes(10);
        assert_eq!(store.run_sweep_at(now), vec![fast.id.clone()]);
        // Sweeping again at the same instant finds nothing new.
        assert!(store.run_sweep_at(now).is_empty());

        let later = slow.created_at + Duration::hours(3);
        let advanced = store.run_sweep_at(later);
        assert_eq!(advanced, vec![fast.id.clone(), slow.id.clone()]);
        assert_eq!(store.list_tasks(&TaskFilter::default()).len(), 3);
    }

    #[test]
    fn test_manually_rescheduled_task_becomes_due() {
        let store = TaskStore::new();
        let task = store.add_task(NewTask::new("ops", "Checklist").recurring(60)).unwrap();
        let past = task.created_at - Duration::minutes(1);
        let update = TaskUpdate {
            next_run_at: Some(past),
            ..TaskUpdate::default()
        };
        store.update_task(&task.id, update).unwrap();
        assert_eq!(store.run_sweep_at(task.created_at), vec![task.id]);
    }

    #[test]
    fn test_sweep_interleaved_with_writes() {
        let store = Arc::new(TaskStore::new());
        let ids: Vec<String> = (0..4)
            .map(|i| {
                store
                    .add_task(NewTask::new("ops", &format!("Check {i}")).recurring(5))
                    .unwrap()
                    .id
            })
            .collect();
        let demoted = store.add_task(NewTask::new("ops", "Demoted").recurring(5)).unwrap();
        let base = demoted.created_at;

        let mut handles = Vec::new();
        {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for round in 1..=100 {
                    store.run_sweep_at(base + Duration::minutes(5 * round));
                }
            }));
        }
        for id in ids.clone() {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for round in 0..50 {
                    let update = TaskUpdate {
                        details: Some(format!("round {round}")),
                        ..TaskUpdate::default()
                    };
                    store.update_task(&id, update).unwrap();
                }
            }));
        }
        {
            let store = store.clone();
            let id = demoted.id.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    store
                        .add_task(NewTask::new("ops", &format!("Late {i}")).recurring(10))
                        .unwrap();
                }
                let update = TaskUpdate {
                    is_recurring: Some(false),
                    ..TaskUpdate::default()
                };
                store.update_task(&id, update).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for id in &ids {
            assert_eq!(store.get_task(id).unwrap().details, "round 49");
        }
        let demoted = store.get_task(&demoted.id).unwrap();
        assert!(!demoted.is_recurring);
        assert!(demoted.next_run_at.is_none());

        let tasks = store.list_tasks(&TaskFilter::default());
        assert_eq!(tasks.len(), 30);
        for task in &tasks {
            assert_eq!(task.next_run_at.is_some(), task.is_recurring, "task {}", task.title);
            assert_eq!(task.interval_minutes.is_some(), task.is_recurring, "task {}", task.title);
            assert!(task.updated_at >= task.created_at, "task {}", task.title);
        }
    }

    #[tokio::test]
    async fn test_spawn_sweeper_advances_due_tasks() {
        let store = Arc::new(TaskStore::new());
        let task = store.add_task(NewTask::new("ops", "Checklist").recurring(5)).unwrap();
        store
            .update_task(
                &task.id,
                TaskUpdate {
                    next_run_at: Some(task.created_at - Duration::minutes(1)),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();

        let handle = tokio::spawn(spawn_sweeper(store.clone(), 30));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.abort();

        let swept = store.get_task(&task.id).unwrap();
        assert!(swept.next_run_at.unwrap() > task.created_at);
    }
}
