/// Worker pipeline tests
///
/// Board deletion through outbox relay, event bus and cascade consumer, all
/// in memory.

use std::sync::Arc;
use std::time::Duration;

use taskboard_shared::events::memory::InMemoryBus;
use taskboard_shared::models::{CreateBoard, CreateTask, TaskStage};
use taskboard_shared::services::{BoardDeletedHandler, CascadeNotifier, RelayPass};
use taskboard_shared::store::{BoardStore, InMemoryBoardStore, InMemoryTaskStore, TaskStore};
use taskboard_worker::consumer::{CascadeConsumer, ConsumerPass};
use taskboard_worker::relay::{OutboxRelay, RelayConfig};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Pipeline {
    boards: InMemoryBoardStore,
    tasks: InMemoryTaskStore,
    bus: InMemoryBus,
    relay: OutboxRelay,
    consumer: CascadeConsumer,
}

fn pipeline() -> Pipeline {
    let boards = InMemoryBoardStore::new();
    let tasks = InMemoryTaskStore::new();
    let bus = InMemoryBus::new();

    let relay = OutboxRelay::new(
        CascadeNotifier::new(Arc::new(bus.clone()), Arc::new(boards.clone())),
        RelayConfig {
            poll_interval: Duration::from_millis(5),
            max_backoff: Duration::from_millis(40),
            batch_size: 10,
            lease_secs: 30,
        },
    );
    let consumer = CascadeConsumer::new(
        Arc::new(bus.clone()),
        BoardDeletedHandler::new(Arc::new(tasks.clone())),
        10,
    );

    Pipeline {
        boards,
        tasks,
        bus,
        relay,
        consumer,
    }
}

/// Creates a board with `n` tasks, then deletes the board without publishing
async fn delete_board_with_tasks(p: &Pipeline, n: usize) -> Uuid {
    let board = p
        .boards
        .create_board_with_admin(CreateBoard {
            name: "Roadmap".to_string(),
            description: String::new(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();

    for i in 0..n {
        p.tasks
            .insert_task(CreateTask {
                board_id: board.id,
                title: format!("task {}", i),
                description: String::new(),
                created_by: board.created_by,
                assignee_id: None,
                stage: TaskStage::ToDo,
            })
            .await
            .unwrap();
    }

    p.boards.delete_board(board.id).await.unwrap();
    board.id
}

#[tokio::test]
async fn test_relay_then_consume_removes_tasks() {
    let p = pipeline();
    let board_id = delete_board_with_tasks(&p, 3).await;
    let empty_board = delete_board_with_tasks(&p, 0).await;

    assert_eq!(p.tasks.count_for_board(board_id), 3);

    assert_eq!(p.relay.run_once().await.unwrap(), RelayPass { claimed: 2, published: 2 });
    assert_eq!(
        p.consumer.process_batch().await.unwrap(),
        ConsumerPass { fetched: 2, acked: 2 }
    );

    assert_eq!(p.tasks.count_for_board(board_id), 0);
    assert_eq!(p.tasks.count_for_board(empty_board), 0);
    assert!(p.boards.outbox_entries().iter().all(|e| e.is_published()));
}

#[tokio::test]
async fn test_transport_outage_is_bridged_by_the_relay() {
    let p = pipeline();
    let board_id = delete_board_with_tasks(&p, 2).await;

    p.bus.set_failing(true);
    assert_eq!(p.relay.run_once().await.unwrap().failed(), 1);
    assert_eq!(p.consumer.process_batch().await.unwrap(), ConsumerPass::default());
    assert_eq!(p.tasks.count_for_board(board_id), 2);

    p.bus.set_failing(false);
    assert_eq!(p.relay.run_once().await.unwrap().published, 1);
    p.consumer.process_batch().await.unwrap();

    assert_eq!(p.tasks.count_for_board(board_id), 0);
}

#[tokio::test]
async fn test_loops_run_together_until_shutdown() {
    let p = Arc::new(pipeline());
    let shutdown = CancellationToken::new();

    let workers = {
        let p = p.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::join!(
                p.relay.run(shutdown.clone()),
                p.consumer.run(
                    shutdown.clone(),
                    Duration::from_millis(5),
                    Duration::from_millis(40)
                ),
            );
        })
    };

    let board_id = delete_board_with_tasks(&p, 4).await;
    for _ in 0..200 {
        if p.tasks.count_for_board(board_id) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    shutdown.cancel();
    workers.await.unwrap();

    assert_eq!(p.tasks.count_for_board(board_id), 0);
    assert_eq!(p.bus.in_flight(), 0);
}
