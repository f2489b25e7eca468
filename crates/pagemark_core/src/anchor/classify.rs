//! Selector classifier.

use crate::model::annotation::Annotation;

/// Which overlay engine an annotation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Annotations split by modality, input order kept within each bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub text: Vec<Annotation>,
    pub image: Vec<Annotation>,
}

/// Returns the modality of one annotation.
///
/// Any `FragmentSelector`/`SvgSelector` forces image modality, even next to
/// text selectors. Relationship annotations (no selector) are text.
pub fn modality_of(annotation: &Annotation) -> Modality {
    if annotation
        .selectors()
        .iter()
        .any(|selector| selector.is_image_anchor())
    {
        Modality::Image
    } else {
        Modality::Text
    }
}

/// Splits annotations into text and image buckets.
pub fn classify<I>(annotations: I) -> Partition
where
    I: IntoIterator<Item = Annotation>,
{
    let mut partition = Partition::default();
    for annotation in annotations {
        match modality_of(&annotation) {
            Modality::Text => partition.text.push(annotation),
            Modality::Image => partition.image.push(annotation),
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::{classify, modality_of, Modality};
    use crate::model::annotation::Annotation;
    use crate::model::selector::Selector;

    #[test]
    fn image_selector_wins_over_text_selectors() {
        let mixed = Annotation::new(
            "mixed",
            vec![
                Selector::text_position(0, 3),
                Selector::svg("<svg><polygon points=\"0,0 1,1\"/></svg>"),
            ],
        );
        assert_eq!(modality_of(&mixed), Modality::Image);
    }

    #[test]
    fn relationship_is_text() {
        let link = Annotation::new("link", vec![]);
        assert!(link.is_relationship());
        assert_eq!(modality_of(&link), Modality::Text);
    }

    #[test]
    fn keeps_relative_order_per_bucket() {
        let input = vec![
            Annotation::new("t1", vec![Selector::text_quote("alpha")]),
            Annotation::new("i1", vec![Selector::fragment("xywh=1,1,1,1")]),
            Annotation::new("t2", vec![Selector::text_position(4, 9)]),
            Annotation::new("i2", vec![Selector::svg("<svg/>")]),
        ];

        let partition = classify(input);
        let text: Vec<_> = partition.text.iter().map(|a| a.id.as_str()).collect();
        let image: Vec<_> = partition.image.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(text, ["t1", "t2"]);
        assert_eq!(image, ["i1", "i2"]);
    }
}
