use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use taskweave::dag::{compute_levels, topological_order};
use taskweave::queue::ReadyQueue;
use taskweave::types::TaskPriority;
use taskweave::workflow::TaskSpec;

// Acyclic workflows: step N may only depend on steps 0..N-1.
fn acyclic_workflow(max_tasks: usize) -> impl Strategy<Value = Vec<TaskSpec>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..4),
            num_tasks,
        )
        .prop_map(|raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let deps: HashSet<usize> = if i == 0 {
                        HashSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    TaskSpec::new(i, format!("step {i}")).with_dependencies(deps)
                })
                .collect()
        })
    })
}

// Arbitrary workflows, including cycles and dangling references.
fn arbitrary_workflow(max_tasks: usize) -> impl Strategy<Value = Vec<TaskSpec>> {
    proptest::collection::vec(proptest::collection::vec(0..max_tasks + 2, 0..4), 0..=max_tasks)
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, deps)| TaskSpec::new(i, "step").with_dependencies(deps))
                .collect()
        })
}

fn priority() -> impl Strategy<Value = TaskPriority> {
    prop_oneof![
        Just(TaskPriority::Critical),
        Just(TaskPriority::High),
        Just(TaskPriority::Normal),
        Just(TaskPriority::Low),
        Just(TaskPriority::Background),
    ]
}

proptest! {
    #[test]
    fn levels_place_dependencies_strictly_earlier(tasks in acyclic_workflow(12)) {
        let levels = compute_levels(&tasks);

        let mut level_of = HashMap::new();
        for (k, level) in levels.iter().enumerate() {
            for &i in level {
                level_of.insert(i, k);
            }
        }

        for task in &tasks {
            for dep in &task.dependencies {
                prop_assert!(level_of[dep] < level_of[&task.index]);
            }
        }
    }

    #[test]
    fn levels_cover_every_task_exactly_once(tasks in arbitrary_workflow(10)) {
        let levels = compute_levels(&tasks);

        let mut seen: Vec<usize> = levels.iter().flatten().copied().collect();
        seen.sort_unstable();
        let expected: Vec<usize> = (0..tasks.len()).collect();
        prop_assert_eq!(seen, expected);
        prop_assert!(levels.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn topological_order_is_a_permutation(tasks in arbitrary_workflow(10)) {
        let mut order = topological_order(&tasks);
        order.sort_unstable();
        let expected: Vec<usize> = (0..tasks.len()).collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn ready_queue_pops_by_priority_then_arrival(
        priorities in proptest::collection::vec(priority(), 0..40)
    ) {
        let mut queue = ReadyQueue::default();
        for (i, p) in priorities.iter().enumerate() {
            queue.push(*p, format!("t{i}"));
        }

        let mut popped = Vec::new();
        while let Some((p, id)) = queue.pop() {
            let arrival: usize = id[1..].parse().unwrap();
            popped.push((p, arrival));
        }

        let mut expected: Vec<(TaskPriority, usize)> =
            priorities.iter().copied().enumerate().map(|(i, p)| (p, i)).collect();
        expected.sort();
        prop_assert_eq!(popped, expected);
    }
}
