//! Current transformation matrix, for positioning shapes and text (rotate,
//! translate, scale) via the content-stream `cm` operator.

use lopdf::content::Operation;
use lopdf::Object::Real;

use crate::errors::{Result, ValidationError};
use crate::units::Pt;

/// PDF "current transformation matrix". Once emitted via `cm`, it operates on
/// every following painting operator until the enclosing `q`/`Q` scope ends.
#[derive(Debug, Copy, Clone)]
pub enum CurTransMat {
    /// Translation matrix, `(tx, ty)` in points from the page origin.
    Translate(Pt, Pt),
    /// Rotation matrix, counter-clockwise, in degrees.
    Rotate(f32),
    /// Combined rotate + translate matrix (rotation applied first).
    TranslateRotate(Pt, Pt, f32),
    /// Scale matrix (`1.0` = no change). X and Y may differ.
    Scale(f32, f32),
    /// Raw PDF matrix `[a b c d e f]`.
    Raw([f32; 6]),
    /// Identity matrix.
    Identity,
}

impl CurTransMat {
    /// Composes two matrices as `a` followed by `b` (`result = a * b` in PDF's
    /// row-vector convention).
    pub fn combine_matrix(a: [f32; 6], b: [f32; 6]) -> [f32; 6] {
        [
            a[0] * b[0] + a[1] * b[2],
            a[0] * b[1] + a[1] * b[3],
            a[2] * b[0] + a[3] * b[2],
            a[2] * b[1] + a[3] * b[3],
            a[4] * b[0] + a[5] * b[2] + b[4],
            a[4] * b[1] + a[5] * b[3] + b[5],
        ]
    }

    /// A matrix is degenerate when both scale components (`a`, `d`) are zero
    /// -- it would collapse every subsequent path to a single point and must
    /// never be emitted into a content stream.
    pub(crate) fn is_degenerate(matrix: [f32; 6]) -> bool {
        matrix[0] == 0.0 && matrix[3] == 0.0
    }

    /// Builds the `cm` operation for this matrix, rejecting degenerate ones.
    pub(crate) fn to_operation(self) -> Result<Operation> {
        let matrix: [f32; 6] = self.into();
        if CurTransMat::is_degenerate(matrix) {
            return Err(ValidationError::DegenerateMatrix.into());
        }
        let operands = matrix.iter().copied().map(Real).collect();
        Ok(Operation::new("cm", operands))
    }
}

impl From<CurTransMat> for [f32; 6] {
    fn from(val: CurTransMat) -> Self {
        use CurTransMat::*;
        match val {
            Translate(x, y) => [1.0, 0.0, 0.0, 1.0, x.0, y.0],
            Rotate(deg) => {
                let rad = deg.to_radians();
                [rad.cos(), rad.sin(), -rad.sin(), rad.cos(), 0.0, 0.0]
            }
            TranslateRotate(x, y, deg) => {
                let rad = deg.to_radians();
                [rad.cos(), rad.sin(), -rad.sin(), rad.cos(), x.0, y.0]
            }
            Scale(x, y) => [x, 0.0, 0.0, y, 0.0, 0.0],
            Raw(r) => r,
            Identity => [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }
}

impl From<CurTransMat> for Operation {
    fn from(val: CurTransMat) -> Self {
        let matrix: [f32; 6] = val.into();
        let operands = matrix.iter().copied().map(Real).collect();
        Operation::new("cm", operands)
    }
}

impl From<CurTransMat> for lopdf::Object {
    fn from(val: CurTransMat) -> Self {
        let matrix: [f32; 6] = val.into();
        lopdf::Object::Array(matrix.iter().copied().map(Real).collect())
    }
}

/// Text matrix, set via the `Tm` operator. Distinct from `CurTransMat` since
/// text placement lives in its own matrix slot inside `BT`/`ET`.
#[derive(Debug, Copy, Clone)]
pub enum TextMatrix {
    Rotate(f32),
    Translate(Pt, Pt),
    TranslateRotate(Pt, Pt, f32),
    Raw([f32; 6]),
}

impl From<TextMatrix> for [f32; 6] {
    fn from(val: TextMatrix) -> Self {
        use TextMatrix::*;
        match val {
            Translate(x, y) => [1.0, 0.0, 0.0, 1.0, x.0, y.0],
            Rotate(deg) => {
                let rad = deg.to_radians();
                [rad.cos(), rad.sin(), -rad.sin(), rad.cos(), 0.0, 0.0]
            }
            TranslateRotate(x, y, deg) => {
                let rad = deg.to_radians();
                [rad.cos(), rad.sin(), -rad.sin(), rad.cos(), x.0, y.0]
            }
            Raw(r) => r,
        }
    }
}

impl From<TextMatrix> for Operation {
    fn from(val: TextMatrix) -> Self {
        let matrix: [f32; 6] = val.into();
        let operands = matrix.iter().copied().map(Real).collect();
        Operation::new("Tm", operands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_matrix_matches_pdf_convention() {
        let matrix: [f32; 6] = CurTransMat::Translate(Pt(150.0), Pt(50.0)).into();
        assert_eq!(matrix, [1.0, 0.0, 0.0, 1.0, 150.0, 50.0]);
    }

    #[test]
    fn scale_matrix_matches_pdf_convention() {
        let matrix: [f32; 6] = CurTransMat::Scale(2.0, 4.0).into();
        assert_eq!(matrix, [2.0, 0.0, 0.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn rotate_90_matches_page_rotation_example() {
        let matrix: [f32; 6] = CurTransMat::Rotate(90.0).into();
        for (got, want) in matrix.iter().zip([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]) {
            assert!((got - want).abs() < 1e-4, "{matrix:?}");
        }
    }

    #[test]
    fn degenerate_scale_is_rejected() {
        let err = CurTransMat::Scale(0.0, 0.0).to_operation().unwrap_err();
        assert!(matches!(err, crate::errors::Error::Validation(ValidationError::DegenerateMatrix)));
    }

    #[test]
    fn non_degenerate_scale_is_accepted() {
        let result = CurTransMat::Scale(1.0, 1.0).to_operation();
        assert!(result.is_ok());
    }

    #[test]
    fn combine_matrix_composes_translate_then_scale() {
        let translate: [f32; 6] = CurTransMat::Translate(Pt(10.0), Pt(20.0)).into();
        let scale: [f32; 6] = CurTransMat::Scale(2.0, 2.0).into();
        let combined = CurTransMat::combine_matrix(translate, scale);
        // translating by (10, 20), then scaling by 2 moves the origin to (20, 40).
        assert_eq!(combined, [2.0, 0.0, 0.0, 2.0, 20.0, 40.0]);
    }
}
