use crate::utils::error::ClassifyError;
use crate::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 模型与标签所在的资源目录
    pub assets_dir: PathBuf,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 拍摄识别配置
    pub capture_config: CaptureConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 启用图优化
    pub enable_optimization: bool,
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// 模型输入宽度（像素）
    pub input_width: u32,

    /// 模型输入高度（像素）
    pub input_height: u32,

    /// 像素归一化均值
    pub image_mean: f32,

    /// 像素归一化标准差
    pub image_std: f32,

    /// 输入张量名称
    pub input_name: String,

    /// 输出张量名称
    pub output_name: String,

    /// 保留的候选结果数量上限
    pub max_results: usize,

    /// 低于该置信度的候选直接丢弃
    pub confidence_floor: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            input_width: 300,
            input_height: 300,
            image_mean: 128.0,
            image_std: 128.0,
            input_name: "Mul".to_string(),
            output_name: "final_result".to_string(),
            max_results: 3,
            confidence_floor: 0.1,
        }
    }
}

impl Config {
    pub fn new(assets_dir: String, intra_threads: Option<usize>) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let intra_threads = match intra_threads {
            Some(0) => {
                return Err(ClassifyError::Config(
                    "intra_threads must be at least 1".to_string(),
                ));
            }
            Some(n) => n,
            None => (cpu_cores * 3 / 4).max(1), // 默认使用75%的CPU核心
        };

        let onnx_config = OnnxConfig {
            intra_threads,
            enable_optimization: true,
        };

        Ok(Self {
            assets_dir: PathBuf::from(assets_dir),
            onnx_config,
            capture_config: CaptureConfig::default(),
        })
    }

    /// 获取分类模型路径
    pub fn model_path(&self) -> PathBuf {
        self.assets_dir.join("model.onnx")
    }

    /// 获取标签文件路径
    pub fn labels_path(&self) -> PathBuf {
        self.assets_dir.join("labels.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_are_rooted_in_assets_dir() {
        let config = Config::new("assets".to_string(), Some(2)).unwrap();
        assert_eq!(config.model_path(), PathBuf::from("assets/model.onnx"));
        assert_eq!(config.labels_path(), PathBuf::from("assets/labels.txt"));
        assert_eq!(config.onnx_config.intra_threads, 2);
    }

    #[test]
    fn zero_intra_threads_is_rejected() {
        let result = Config::new("assets".to_string(), Some(0));
        assert!(matches!(result, Err(ClassifyError::Config(_))));
    }

    #[test]
    fn default_intra_threads_is_at_least_one() {
        let config = Config::new("assets".to_string(), None).unwrap();
        assert!(config.onnx_config.intra_threads >= 1);
    }
}
