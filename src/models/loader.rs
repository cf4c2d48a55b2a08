use crate::capture::types::DisplayCommand;
use crate::models::{Classifier, ImageClassifier};
use crate::Config;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// 分类器生命周期状态，归属单个拍摄屏幕
#[derive(Clone)]
pub enum ClassifierState {
    /// 后台初始化中
    Loading,

    /// 初始化完成，可以分类
    Ready(Arc<dyn ImageClassifier>),

    /// 初始化失败（可恢复：拍摄按钮保持禁用）
    Failed(String),

    /// 屏幕已销毁，资源已释放
    Closed,
}

impl ClassifierState {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierState::Loading => "loading",
            ClassifierState::Ready(_) => "ready",
            ClassifierState::Failed(_) => "failed",
            ClassifierState::Closed => "closed",
        }
    }
}

/// 显式的"句柄或缺席"单元。写入方只有两个：加载任务与屏幕的销毁回调。
pub struct ClassifierCell {
    state: Mutex<ClassifierState>,
    settled: Notify,
}

impl ClassifierCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClassifierState::Loading),
            settled: Notify::new(),
        }
    }

    pub fn state(&self) -> ClassifierState {
        self.state.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), ClassifierState::Ready(_))
    }

    pub fn failure(&self) -> Option<String> {
        match &*self.state.lock() {
            ClassifierState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// 就绪的分类器句柄；初始化未完成或已释放时返回None
    pub fn ready_handle(&self) -> Option<Arc<dyn ImageClassifier>> {
        match &*self.state.lock() {
            ClassifierState::Ready(classifier) => Some(Arc::clone(classifier)),
            _ => None,
        }
    }

    pub fn set_ready(&self, classifier: Arc<dyn ImageClassifier>) {
        {
            let mut state = self.state.lock();
            match &*state {
                ClassifierState::Loading => *state = ClassifierState::Ready(classifier),
                // 屏幕已销毁：迟到的句柄必须立即释放
                ClassifierState::Closed => classifier.close(),
                _ => {}
            }
        }
        self.settled.notify_waiters();
    }

    pub fn set_failed(&self, reason: String) {
        {
            let mut state = self.state.lock();
            if matches!(*state, ClassifierState::Loading) {
                *state = ClassifierState::Failed(reason);
            }
        }
        self.settled.notify_waiters();
    }

    /// 释放句柄并进入Closed；幂等
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if let ClassifierState::Ready(classifier) = &*state {
                classifier.close();
            }
            *state = ClassifierState::Closed;
        }
        self.settled.notify_waiters();
    }

    /// 等待初始化离开Loading状态
    pub async fn wait_settled(&self) {
        loop {
            let notified = self.settled.notified();
            if !matches!(*self.state.lock(), ClassifierState::Loading) {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ClassifierCell {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ClassifierLoader;

impl ClassifierLoader {
    /// 在后台任务中初始化分类器。任务归屏幕所有，销毁时abort；
    /// 被abort的任务不会再写入cell或回调UI通道。
    pub fn spawn(
        config: Config,
        cell: Arc<ClassifierCell>,
        display_tx: UnboundedSender<DisplayCommand>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let loaded = tokio::task::spawn_blocking(move || Classifier::new(&config)).await;

            match loaded {
                Ok(Ok(classifier)) => {
                    cell.set_ready(Arc::new(classifier));
                    if cell.is_ready() {
                        tracing::info!("Classifier ready; enabling capture");
                        let _ = display_tx.send(DisplayCommand::SetCaptureEnabled(true));
                    }
                }
                Ok(Err(err)) => {
                    tracing::error!("Classifier initialization failed: {}", err);
                    let _ = display_tx.send(DisplayCommand::ShowResult(format!(
                        "classifier unavailable: {}",
                        err
                    )));
                    cell.set_failed(err.to_string());
                }
                Err(err) => {
                    // spawn_blocking被取消或崩溃
                    tracing::warn!("Classifier initialization did not complete: {}", err);
                    cell.set_failed(err.to_string());
                }
            }
        })
    }
}
