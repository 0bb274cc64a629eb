//! 在背景執行緒執行長時間工作，透過 channel 回報進度與最終結果

use anyhow::{Context, Result, anyhow};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

#[derive(Debug)]
pub enum JobMessage<T> {
    Progress { completed: usize, total: usize },
    Finished(Result<T>),
}

/// 背景工作的控制代碼：先收到零或多個 `Progress`，最後恰好一個 `Finished`
pub struct JobHandle<T> {
    receiver: Receiver<JobMessage<T>>,
    thread: JoinHandle<()>,
}

impl<T> JobHandle<T> {
    /// 阻塞直到工作結束，期間把進度轉交給 `on_progress`
    pub fn wait<F>(self, mut on_progress: F) -> Result<T>
    where
        F: FnMut(usize, usize),
    {
        let mut outcome = None;
        for message in &self.receiver {
            match message {
                JobMessage::Progress { completed, total } => on_progress(completed, total),
                JobMessage::Finished(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }

        self.thread
            .join()
            .map_err(|_| anyhow!("背景工作執行緒異常結束"))?;

        outcome.unwrap_or_else(|| Err(anyhow!("背景工作未回傳結果")))
    }
}

pub fn spawn_job<T, F>(name: &str, job: F) -> Result<JobHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn FnMut(usize, usize)) -> Result<T> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();

    let thread = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let progress_sender = sender.clone();
            let mut report = move |completed, total| {
                let _ = progress_sender.send(JobMessage::Progress { completed, total });
            };
            let result = job(&mut report);
            let _ = sender.send(JobMessage::Finished(result));
        })
        .with_context(|| format!("無法建立背景執行緒: {name}"))?;

    Ok(JobHandle { receiver, thread })
}
