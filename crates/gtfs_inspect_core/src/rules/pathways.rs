use crate::feed::PATHWAYS_FILE;
use crate::{EntityValidator, NoticeContainer, NoticeSeverity, ValidationNotice};
use gtfs_inspect_model::Pathway;

const CODE_PATHWAY_LOOP: &str = "pathway_loop";

/// A pathway must connect two distinct locations.
#[derive(Debug, Default)]
pub struct PathwayLoopValidator;

impl EntityValidator<Pathway> for PathwayLoopValidator {
    fn name(&self) -> &'static str {
        "pathway_loop"
    }

    fn validate_row(&self, pathway: &Pathway, row_number: u64, notices: &mut NoticeContainer) {
        let from = pathway.from_stop_id.trim();
        let to = pathway.to_stop_id.trim();
        if from.is_empty() || from != to {
            return;
        }
        let mut notice = ValidationNotice::new(
            CODE_PATHWAY_LOOP,
            NoticeSeverity::Error,
            "pathway starts and ends at the same location",
        );
        notice.file = Some(PATHWAYS_FILE.to_string());
        notice.row = Some(row_number);
        notice.insert_context_field("csvRowNumber", row_number);
        notice.insert_context_field("pathwayId", pathway.pathway_id.as_str());
        notice.insert_context_field("stopId", from);
        notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pathway_looping_on_one_stop() {
        let pathway = Pathway {
            pathway_id: "P1".to_string(),
            from_stop_id: "A".to_string(),
            to_stop_id: "A".to_string(),
            ..Default::default()
        };
        let mut notices = NoticeContainer::new();
        PathwayLoopValidator.validate_row(&pathway, 2, &mut notices);
        assert_eq!(notices.count(CODE_PATHWAY_LOOP), 1);
    }

    #[test]
    fn distinct_endpoints_pass() {
        let pathway = Pathway {
            pathway_id: "P1".to_string(),
            from_stop_id: "A".to_string(),
            to_stop_id: "B".to_string(),
            ..Default::default()
        };
        let mut notices = NoticeContainer::new();
        PathwayLoopValidator.validate_row(&pathway, 2, &mut notices);
        assert!(notices.is_empty());
    }
}
