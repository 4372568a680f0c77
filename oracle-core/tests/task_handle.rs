use oracle_core::TaskHandle;

#[tokio::test(flavor = "multi_thread")]
async fn task_handle_stop_graceful() {
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let _ = stop_rx.await;
        let _ = done_tx.send(());
    });

    let handle = TaskHandle::new(task, stop_tx);
    handle.stop().await;

    let _ = tokio::time::timeout(std::time::Duration::from_millis(100), done_rx)
        .await
        .expect("task did not complete after stop()");
}

#[tokio::test(flavor = "multi_thread")]
async fn task_handle_abort_only_cancels_without_stop_signal() {
    let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let _ = started_tx.send(());
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    });

    started_rx.await.expect("task did not start");
    let handle = TaskHandle::new_abort_only(task);
    handle.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_handle_sends_stop_then_aborts() {
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let _ = stop_rx.await;
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    });

    let handle = TaskHandle::new(task, stop_tx);
    drop(handle);
    // No assertion beyond "this does not hang" — Drop is fire-and-forget.
}
