use std::collections::BTreeMap;

use crate::feed::SHAPES_FILE;
use crate::{CsvTable, NoticeContainer, NoticeSeverity, TableValidator, ValidationNotice};
use gtfs_inspect_model::Shape;

const CODE_SINGLE_SHAPE_POINT: &str = "single_shape_point";

/// A polyline of one point cannot describe a path.
#[derive(Debug, Default)]
pub struct SingleShapePointValidator;

impl TableValidator<Shape> for SingleShapePointValidator {
    fn name(&self) -> &'static str {
        "single_shape_point"
    }

    fn validate_table(&self, table: &CsvTable<Shape>, notices: &mut NoticeContainer) {
        let mut point_counts: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
        for (index, shape) in table.rows.iter().enumerate() {
            let shape_id = shape.shape_id.trim();
            if shape_id.is_empty() {
                continue;
            }
            let entry = point_counts
                .entry(shape_id)
                .or_insert((table.row_number(index), 0));
            entry.1 += 1;
        }

        for (shape_id, (row_number, count)) in point_counts {
            if count == 1 {
                let mut notice = ValidationNotice::new(
                    CODE_SINGLE_SHAPE_POINT,
                    NoticeSeverity::Warning,
                    "shape has a single point",
                );
                notice.file = Some(SHAPES_FILE.to_string());
                notice.row = Some(row_number);
                notice.insert_context_field("csvRowNumber", row_number);
                notice.insert_context_field("shapeId", shape_id);
                notices.push(notice);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(id: &str, sequence: u32) -> Shape {
        Shape {
            shape_id: id.to_string(),
            shape_pt_lat: 52.0,
            shape_pt_lon: 4.0,
            shape_pt_sequence: sequence,
            ..Default::default()
        }
    }

    #[test]
    fn flags_one_point_shapes() {
        let table = CsvTable {
            headers: vec!["shape_id".to_string()],
            rows: vec![shape("SH1", 1), shape("SH2", 1), shape("SH2", 2)],
            row_numbers: vec![2, 3, 4],
        };
        let mut notices = NoticeContainer::new();
        SingleShapePointValidator.validate_table(&table, &mut notices);

        assert_eq!(notices.count(CODE_SINGLE_SHAPE_POINT), 1);
        let notice = notices.iter().next().unwrap();
        assert_eq!(
            notice.context.get("shapeId").unwrap().as_str().unwrap(),
            "SH1"
        );
    }
}
