use crate::config::{CaptureConfig, Config};
use crate::image::transforms;
use crate::utils::error::ClassifyError;
use crate::Result;
use image::DynamicImage;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::fs;
use std::path::Path;

/// 单个候选识别结果，按置信度降序排列
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// 识别出的标签
    pub title: String,

    /// 置信度 (0.0 - 1.0)
    pub confidence: f32,
}

/// 图像分类器统一接口
pub trait ImageClassifier: Send + Sync {
    /// 对单张图像分类，返回按置信度降序排列的候选列表
    fn recognize_image(&self, image: &DynamicImage) -> Result<Vec<Recognition>>;

    /// 释放底层推理资源；释放后recognize_image返回ClassifierClosed
    fn close(&self);
}

pub struct Classifier {
    session: Mutex<Option<Session>>,
    labels: Vec<String>,
    capture_config: CaptureConfig,
}

impl Classifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.model_path();
        let labels_path = config.labels_path();

        if !model_path.exists() {
            return Err(ClassifyError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        if !labels_path.exists() {
            return Err(ClassifyError::ModelLoad(format!(
                "Label file not found: {}",
                labels_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());
        tracing::info!("Loading labels from: {}", labels_path.display());

        let optimization_level = if config.onnx_config.enable_optimization {
            GraphOptimizationLevel::Level3
        } else {
            GraphOptimizationLevel::Disable
        };

        let session = Session::builder()?
            .with_optimization_level(optimization_level)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(&model_path)?;

        let capture_config = config.capture_config.clone();

        // 校验配置的输入输出名称确实存在于模型图中
        if !session
            .inputs
            .iter()
            .any(|input| input.name == capture_config.input_name)
        {
            let available: Vec<String> =
                session.inputs.iter().map(|i| i.name.clone()).collect();
            return Err(ClassifyError::ModelLoad(format!(
                "Model input '{}' not found. Available inputs: {:?}",
                capture_config.input_name, available
            )));
        }

        if !session
            .outputs
            .iter()
            .any(|output| output.name == capture_config.output_name)
        {
            let available: Vec<String> =
                session.outputs.iter().map(|o| o.name.clone()).collect();
            return Err(ClassifyError::ModelLoad(format!(
                "Model output '{}' not found. Available outputs: {:?}",
                capture_config.output_name, available
            )));
        }

        let labels = Self::load_labels(&labels_path)?;
        tracing::info!("Loaded {} labels", labels.len());

        Ok(Self {
            session: Mutex::new(Some(session)),
            labels,
            capture_config,
        })
    }

    /// 加载标签文件，每行一个标签
    fn load_labels(path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .map_err(|e| ClassifyError::ModelLoad(format!("Failed to read label file: {}", e)))?;

        let labels = parse_labels(&content);
        if labels.is_empty() {
            return Err(ClassifyError::ModelLoad("Label file is empty".to_string()));
        }

        Ok(labels)
    }
}

impl ImageClassifier for Classifier {
    fn recognize_image(&self, image: &DynamicImage) -> Result<Vec<Recognition>> {
        let capture = &self.capture_config;

        // 预处理图像并添加batch维度
        let input = transforms::to_model_input(
            image,
            capture.input_width,
            capture.input_height,
            capture.image_mean,
            capture.image_std,
        );

        // 推理 - 立即提取数据避免生命周期冲突
        let input_tensor = Tensor::from_array(input)?;
        let predictions = {
            let mut guard = self.session.lock();
            let session = guard.as_mut().ok_or(ClassifyError::ClassifierClosed)?;
            let outputs = session.run(inputs![capture.input_name.as_str() => input_tensor])?;

            match outputs.get(&capture.output_name) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(ClassifyError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        capture.output_name, available
                    )));
                }
            }
        };

        let shape = predictions.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifyError::Inference(format!(
                "Expected [1, num_labels] score tensor, got {:?}",
                shape
            )));
        }

        let scores: Vec<f32> = predictions.iter().copied().collect();
        rank_predictions(
            &self.labels,
            &scores,
            capture.confidence_floor,
            capture.max_results,
        )
    }

    fn close(&self) {
        let mut guard = self.session.lock();
        if guard.take().is_some() {
            tracing::debug!("Classifier session released");
        }
    }
}

fn parse_labels(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 标签与得分配对，过滤低置信度候选，降序截取前max_results个
fn rank_predictions(
    labels: &[String],
    scores: &[f32],
    confidence_floor: f32,
    max_results: usize,
) -> Result<Vec<Recognition>> {
    if labels.len() != scores.len() {
        return Err(ClassifyError::Inference(format!(
            "Model produced {} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let mut recognitions: Vec<Recognition> = labels
        .iter()
        .zip(scores)
        .filter(|(_, &score)| score > confidence_floor)
        .map(|(label, &score)| Recognition {
            title: label.clone(),
            confidence: score,
        })
        .collect();

    recognitions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    recognitions.truncate(max_results);

    Ok(recognitions)
}
