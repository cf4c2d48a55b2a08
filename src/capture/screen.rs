use crate::capture::messages;
use crate::capture::types::DisplayCommand;
use crate::config::Config;
use crate::image::transforms;
use crate::models::{ClassifierCell, ClassifierLoader, ClassifierState};
use crate::utils::error::ClassifyError;
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// 拍摄屏幕：独占一个分类器句柄及其初始化任务。
/// 进入屏幕开始加载，退出屏幕中止加载并释放句柄。
pub struct CaptureScreen {
    config: Config,
    cell: Arc<ClassifierCell>,
    init_task: Option<JoinHandle<()>>,
    display_tx: UnboundedSender<DisplayCommand>,
}

impl CaptureScreen {
    /// 创建屏幕并立即开始后台初始化分类器。
    /// 初始化完成前拍摄按钮保持禁用。
    pub fn new(config: Config, display_tx: UnboundedSender<DisplayCommand>) -> Self {
        let cell = Arc::new(ClassifierCell::new());
        let init_task = ClassifierLoader::spawn(config.clone(), cell.clone(), display_tx.clone());

        Self {
            config,
            cell,
            init_task: Some(init_task),
            display_tx,
        }
    }

    #[cfg(test)]
    fn with_cell(
        config: Config,
        cell: Arc<ClassifierCell>,
        display_tx: UnboundedSender<DisplayCommand>,
    ) -> Self {
        Self {
            config,
            cell,
            init_task: None,
            display_tx,
        }
    }

    pub fn classifier_state(&self) -> ClassifierState {
        self.cell.state()
    }

    pub fn classifier_failure(&self) -> Option<String> {
        self.cell.failure()
    }

    /// 等待初始化结束（成功或失败）
    pub async fn wait_for_classifier(&self) {
        self.cell.wait_settled().await;
    }

    /// 处理一次拍摄事件。结果经显示通道回报，错误在内部消化：
    /// 销毁竞争只记日志，绝不让屏幕崩溃。
    pub async fn on_capture(&self, raw_image: DynamicImage) {
        let capture = &self.config.capture_config;

        // 一次拍摄-识别周期内禁用按钮，显式串行化请求
        let _ = self.display_tx.send(DisplayCommand::SetCaptureEnabled(false));
        let _ = self.display_tx.send(DisplayCommand::ShowProgress(true));

        // 先缩放并立即显示；显示不依赖识别结果
        let scaled = transforms::resize_to_input(&raw_image, capture.input_width, capture.input_height);
        let _ = self.display_tx.send(DisplayCommand::ShowImage(scaled.clone()));

        let Some(classifier) = self.cell.ready_handle() else {
            tracing::debug!("Capture ignored: classifier not ready");
            let _ = self.display_tx.send(DisplayCommand::ShowProgress(false));
            return;
        };

        // 推理放到阻塞线程池，不占用UI上下文
        let result =
            tokio::task::spawn_blocking(move || classifier.recognize_image(&scaled)).await;

        match result {
            Ok(Ok(recognitions)) => {
                let message = messages::recognition_message(&recognitions);
                let _ = self.display_tx.send(DisplayCommand::ShowProgress(false));
                let _ = self.display_tx.send(DisplayCommand::SetCaptureEnabled(true));
                let _ = self.display_tx.send(DisplayCommand::ShowResult(message));
            }
            Ok(Err(ClassifyError::ClassifierClosed)) => {
                // 屏幕销毁与推理竞争：丢弃结果，不回写UI
                tracing::warn!("Classifier closed before recognition finished; dropping result");
            }
            Ok(Err(err)) => {
                tracing::error!("Recognition failed: {}", err);
                let _ = self.display_tx.send(DisplayCommand::ShowProgress(false));
                let _ = self.display_tx.send(DisplayCommand::SetCaptureEnabled(true));
            }
            Err(err) => {
                tracing::warn!("Recognition task did not complete: {}", err);
            }
        }
    }

    /// 屏幕退出：中止未完成的初始化并释放分类器。幂等。
    pub fn destroy(&mut self) {
        if let Some(task) = self.init_task.take() {
            task.abort();
        }
        self.cell.close();
    }
}

impl Drop for CaptureScreen {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::FakeClassifier;
    use crate::models::{ImageClassifier, Recognition};
    use image::{DynamicImage, Rgb, RgbImage};
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn test_config() -> Config {
        Config::new("assets".to_string(), Some(1)).unwrap()
    }

    fn test_photo() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([7, 7, 7])))
    }

    fn recognition(title: &str, confidence: f32) -> Recognition {
        Recognition {
            title: title.to_string(),
            confidence,
        }
    }

    fn drain(rx: &mut UnboundedReceiver<DisplayCommand>) -> Vec<DisplayCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    fn shown_result(commands: &[DisplayCommand]) -> Option<String> {
        commands.iter().find_map(|command| match command {
            DisplayCommand::ShowResult(text) => Some(text.clone()),
            _ => None,
        })
    }

    fn ready_screen(
        results: Vec<Recognition>,
    ) -> (
        CaptureScreen,
        Arc<FakeClassifier>,
        UnboundedReceiver<DisplayCommand>,
    ) {
        let classifier = Arc::new(FakeClassifier::with_results(results));
        let cell = Arc::new(ClassifierCell::new());
        cell.set_ready(classifier.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let screen = CaptureScreen::with_cell(test_config(), cell, tx);
        (screen, classifier, rx)
    }

    #[tokio::test]
    async fn capture_shows_scaled_image_and_confident_result() {
        let (screen, _, mut rx) = ready_screen(vec![recognition("Thor", 0.97)]);

        screen.on_capture(test_photo()).await;

        let commands = drain(&mut rx);
        let image_dims = commands.iter().find_map(|command| match command {
            DisplayCommand::ShowImage(image) => Some((image.width(), image.height())),
            _ => None,
        });
        assert_eq!(image_dims, Some((300, 300)));
        assert_eq!(shown_result(&commands).as_deref(), Some("confident: it's Thor"));
    }

    #[tokio::test]
    async fn capture_with_no_recognitions_shows_no_match() {
        let (screen, _, mut rx) = ready_screen(vec![]);

        screen.on_capture(test_photo()).await;

        let commands = drain(&mut rx);
        assert_eq!(shown_result(&commands).as_deref(), Some("no match found"));
    }

    #[tokio::test]
    async fn capture_reenables_the_trigger_after_a_result() {
        let (screen, _, mut rx) = ready_screen(vec![recognition("Loki", 0.80)]);

        screen.on_capture(test_photo()).await;

        let commands = drain(&mut rx);
        assert!(matches!(
            commands.last(),
            Some(DisplayCommand::ShowResult(_))
        ));
        assert!(commands
            .iter()
            .any(|c| matches!(c, DisplayCommand::SetCaptureEnabled(true))));
        assert_eq!(shown_result(&commands).as_deref(), Some("maybe: it's Loki"));
    }

    #[tokio::test]
    async fn closed_classifier_race_drops_the_result() {
        let (screen, classifier, mut rx) = ready_screen(vec![recognition("Thor", 0.97)]);

        // 模拟句柄在推理解决之前被释放
        classifier.close();
        screen.on_capture(test_photo()).await;

        let commands = drain(&mut rx);
        assert_eq!(shown_result(&commands), None);
        assert_eq!(classifier.call_count(), 1);
    }

    #[tokio::test]
    async fn capture_before_ready_is_guarded() {
        let cell = Arc::new(ClassifierCell::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let screen = CaptureScreen::with_cell(test_config(), cell, tx);

        screen.on_capture(test_photo()).await;

        let commands = drain(&mut rx);
        assert_eq!(shown_result(&commands), None);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, DisplayCommand::SetCaptureEnabled(true))));
    }

    #[tokio::test]
    async fn destroy_cancels_pending_initialization() {
        let cell = Arc::new(ClassifierCell::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        // 一个永远不会完成的初始化任务
        let pending_init = {
            let cell = cell.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                cell.set_ready(Arc::new(FakeClassifier::with_results(vec![])));
                let _ = tx.send(DisplayCommand::SetCaptureEnabled(true));
            })
        };

        let mut screen = CaptureScreen::with_cell(test_config(), cell.clone(), tx);
        screen.init_task = Some(pending_init);

        screen.destroy();
        tokio::task::yield_now().await;

        assert_eq!(cell.state().name(), "closed");
        assert!(cell.ready_handle().is_none());
        let commands = drain(&mut rx);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, DisplayCommand::SetCaptureEnabled(true))));

        // 再次销毁必须无副作用
        screen.destroy();
    }

    #[tokio::test]
    async fn capture_after_destroy_is_ignored() {
        let (mut screen, classifier, mut rx) = ready_screen(vec![recognition("Thor", 0.97)]);

        screen.destroy();
        drain(&mut rx);

        screen.on_capture(test_photo()).await;

        let commands = drain(&mut rx);
        assert_eq!(shown_result(&commands), None);
        assert!(classifier.is_closed());
        assert_eq!(classifier.call_count(), 0);
    }
}
