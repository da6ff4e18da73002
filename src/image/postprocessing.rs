use crate::config::NUM_CLASSES;
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单次预测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 预测的类别名称
    pub label: String,
    /// 类别索引
    pub index: usize,
    /// 模型原始分数，不做重新归一化
    pub confidence: f32,
}

impl PredictionResult {
    /// 置信度百分比（向下取整）
    pub fn percent(&self) -> u32 {
        (self.confidence * 100.0).floor().max(0.0) as u32
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}%", self.label, self.percent())
    }
}

/// 单个类别的分数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

pub struct Postprocessor;

impl Postprocessor {
    /// 取最大分数对应的类别
    ///
    /// 分数相同时取索引最小的类别。输出长度必须等于类别数。
    pub fn postprocess(output: &[f32], labels: &[&str; NUM_CLASSES]) -> Result<PredictionResult> {
        if output.len() != NUM_CLASSES {
            return Err(ClassifyError::EmptyOutput {
                expected: NUM_CLASSES,
                actual: output.len(),
            });
        }

        let index = Self::argmax(output).ok_or_else(|| {
            ClassifyError::Inference(format!("Model produced no finite scores: {:?}", output))
        })?;

        Ok(PredictionResult {
            label: labels[index].to_string(),
            index,
            confidence: output[index],
        })
    }

    /// 最大值索引，NaN 不参与比较（不会被选为最大值）；全部为 NaN 时返回 None
    pub fn argmax(scores: &[f32]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;

        for (i, &score) in scores.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }

        best.map(|(i, _)| i)
    }

    /// 将分数与类别名称配对
    pub fn label_scores(output: &[f32], labels: &[&str; NUM_CLASSES]) -> Vec<LabelScore> {
        labels
            .iter()
            .zip(output.iter())
            .map(|(label, &score)| LabelScore {
                label: label.to_string(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CLASS_LABELS;

    #[test]
    fn picks_highest_score() {
        let result = Postprocessor::postprocess(&[0.1, 0.7, 0.05, 0.15], &CLASS_LABELS).unwrap();
        assert_eq!(result.label, "Meningioma");
        assert_eq!(result.index, 1);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let result = Postprocessor::postprocess(&[0.5, 0.5, 0.0, 0.0], &CLASS_LABELS).unwrap();
        assert_eq!(result.label, "Glioma");
        assert_eq!(result.confidence, 0.5);

        let result = Postprocessor::postprocess(&[0.0, 0.2, 0.9, 0.9], &CLASS_LABELS).unwrap();
        assert_eq!(result.label, "No tumor");
    }

    #[test]
    fn scores_are_not_renormalized() {
        let result = Postprocessor::postprocess(&[3.0, -1.0, 12.5, 0.0], &CLASS_LABELS).unwrap();
        assert_eq!(result.label, "No tumor");
        assert_eq!(result.confidence, 12.5);
    }

    #[test]
    fn wrong_length_fails_with_empty_output() {
        let err = Postprocessor::postprocess(&[0.1, 0.2, 0.7], &CLASS_LABELS).unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyOutput { expected: 4, actual: 3 }));

        let err = Postprocessor::postprocess(&[], &CLASS_LABELS).unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyOutput { expected: 4, actual: 0 }));
    }

    #[test]
    fn nan_scores_are_skipped() {
        let result =
            Postprocessor::postprocess(&[f32::NAN, 0.1, 0.3, 0.2], &CLASS_LABELS).unwrap();
        assert_eq!(result.label, "No tumor");

        let err = Postprocessor::postprocess(&[f32::NAN; 4], &CLASS_LABELS).unwrap_err();
        assert!(matches!(err, ClassifyError::Inference(_)));
    }

    #[test]
    fn argmax_never_selects_nan() {
        assert_eq!(Postprocessor::argmax(&[f32::NAN, f32::NAN]), None);
        assert_eq!(Postprocessor::argmax(&[1.0, f32::NAN, 1.0]), Some(0));
        assert_eq!(Postprocessor::argmax(&[]), None);
    }

    #[test]
    fn display_rounds_confidence_down() {
        let result = PredictionResult {
            label: "Pituitary".to_string(),
            index: 3,
            confidence: 0.999,
        };
        assert_eq!(result.to_string(), "Pituitary - 99%");

        let result = PredictionResult {
            label: "Glioma".to_string(),
            index: 0,
            confidence: 0.5,
        };
        assert_eq!(result.to_string(), "Glioma - 50%");
    }

    #[test]
    fn label_scores_keep_model_order() {
        let scores = Postprocessor::label_scores(&[0.1, 0.2, 0.3, 0.4], &CLASS_LABELS);
        let labels: Vec<&str> = scores.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, CLASS_LABELS);
        assert_eq!(scores[3].score, 0.4);
    }
}
