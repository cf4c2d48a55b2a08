use image::DynamicImage;

/// 发往UI线程的显示指令。所有可见状态变更都经由这一通道，
/// 由单一UI上下文顺序消费。
#[derive(Debug, Clone)]
pub enum DisplayCommand {
    /// 显示拍摄到的图像
    ShowImage(DynamicImage),

    /// 显示识别结果文案
    ShowResult(String),

    /// 拍摄按钮可用状态
    SetCaptureEnabled(bool),

    /// 进度指示器可见性
    ShowProgress(bool),
}
