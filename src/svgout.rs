// snapshot output: serialize a composition as an SVG document.
//
// canvas coordinates are (row, col) at working resolution; SVG wants (x, y)
// at original-image resolution, so every vertex is axis-swapped and scaled
// back up by the inverse of the loader's downscale factor.

use std::path::Path;

use svg::node::element::{Group, Polygon, Rectangle};
use svg::Document;

use crate::builder::Composition;

fn rgb(color: [u8; 3]) -> String {
    format!("rgb({},{},{})", color[0], color[1], color[2])
}

/// build the SVG document for a composition snapshot
pub fn document(composition: &Composition, inv_scale: f64) -> Document {
    let width = (composition.width as f64 * inv_scale) as i64;
    let height = (composition.height as f64 * inv_scale) as i64;

    let background = Rectangle::new()
        .set("x", 0)
        .set("y", 0)
        .set("width", "100%")
        .set("height", "100%")
        .set("fill", rgb(composition.background));

    let mut shapes = Group::new().set("id", "shapes");
    for shape in &composition.shapes {
        let points = shape
            .points
            .iter()
            .map(|&(row, col)| {
                // swap row/col into x/y and map back to original size
                format!(
                    "{},{}",
                    (col as f64 * inv_scale) as i64,
                    (row as f64 * inv_scale) as i64
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        shapes = shapes.add(
            Polygon::new()
                .set("points", points)
                .set("fill", rgb(shape.rgb))
                .set("opacity", shape.alpha),
        );
    }

    Document::new()
        .set("width", width)
        .set("height", height)
        .add(background)
        .add(shapes)
}

/// write a composition snapshot to disk
pub fn write_svg(
    composition: &Composition,
    inv_scale: f64,
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    svg::save(path, &document(composition, inv_scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CommittedShape;

    fn sample() -> Composition {
        Composition {
            height: 20,
            width: 30,
            background: [10, 20, 30],
            shapes: vec![CommittedShape {
                points: vec![(1, 2), (5, 6), (9, 2)],
                rgb: [200, 100, 50],
                alpha: 0.5,
            }],
        }
    }

    #[test]
    fn document_scales_and_swaps_axes() {
        let doc = document(&sample(), 2.0).to_string();

        // 30 cols * 2 wide, 20 rows * 2 tall
        assert!(doc.contains("width=\"60\""), "{doc}");
        assert!(doc.contains("height=\"40\""), "{doc}");
        // vertex (row 1, col 2) becomes x=4, y=2
        assert!(doc.contains("4,2"), "{doc}");
        assert!(doc.contains("rgb(200,100,50)"), "{doc}");
        assert!(doc.contains("rgb(10,20,30)"), "{doc}");
    }

    #[test]
    fn one_polygon_element_per_shape() {
        let mut composition = sample();
        composition.shapes.push(composition.shapes[0].clone());
        let doc = document(&composition, 1.0).to_string();
        assert_eq!(doc.matches("<polygon").count(), 2);
    }
}
