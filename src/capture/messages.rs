use crate::models::Recognition;

pub const NO_MATCH_MESSAGE: &str = "no match found";

const CONFIDENT_THRESHOLD: f32 = 0.95;
const LIKELY_THRESHOLD: f32 = 0.85;

/// 根据最高置信度候选选择结果文案。纯函数，只依赖top-1的标签和置信度。
pub fn recognition_message(recognitions: &[Recognition]) -> String {
    let Some(top) = recognitions.first() else {
        return NO_MATCH_MESSAGE.to_string();
    };

    if top.confidence > CONFIDENT_THRESHOLD {
        format!("confident: it's {}", top.title)
    } else if top.confidence > LIKELY_THRESHOLD {
        format!("likely: it's {}", top.title)
    } else {
        format!("maybe: it's {}", top.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognition(title: &str, confidence: f32) -> Recognition {
        Recognition {
            title: title.to_string(),
            confidence,
        }
    }

    #[test]
    fn high_confidence_is_confident() {
        let message = recognition_message(&[recognition("Thor", 0.97)]);
        assert_eq!(message, "confident: it's Thor");
    }

    #[test]
    fn low_confidence_is_maybe() {
        let message = recognition_message(&[recognition("Loki", 0.80)]);
        assert_eq!(message, "maybe: it's Loki");
    }

    #[test]
    fn empty_recognitions_is_no_match() {
        assert_eq!(recognition_message(&[]), NO_MATCH_MESSAGE);
    }

    #[test]
    fn exactly_095_falls_in_the_likely_bucket() {
        let message = recognition_message(&[recognition("Thor", 0.95)]);
        assert_eq!(message, "likely: it's Thor");
    }

    #[test]
    fn just_above_095_is_confident() {
        let message = recognition_message(&[recognition("Thor", 0.9501)]);
        assert_eq!(message, "confident: it's Thor");
    }

    #[test]
    fn exactly_085_falls_in_the_maybe_bucket() {
        let message = recognition_message(&[recognition("Loki", 0.85)]);
        assert_eq!(message, "maybe: it's Loki");
    }

    #[test]
    fn only_the_top_recognition_is_used() {
        let message = recognition_message(&[
            recognition("Thor", 0.97),
            recognition("Loki", 0.96),
        ]);
        assert_eq!(message, "confident: it's Thor");
    }
}
