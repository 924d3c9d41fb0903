use std::fmt::Display;
use std::fmt::Formatter;

pub type EcResult<T> = Result<T, EcError>;

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum EcError {
    NotEnoughData,
    ValueOutOfRange,
    PointNotOnCurve,
    CurveMismatch,
}

impl ::std::fmt::Debug for EcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl From<EcError> for &str {
    fn from(e: EcError) -> Self {
        match e {
            EcError::NotEnoughData => "the input is empty",
            EcError::ValueOutOfRange => "numeric value out of range",
            EcError::PointNotOnCurve => "the point is not on the curve",
            EcError::CurveMismatch => "the points belong to different curves",
        }
    }
}

impl Display for EcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err_msg = match self {
            EcError::NotEnoughData => "the input is empty",
            EcError::ValueOutOfRange => "numeric value out of range",
            EcError::PointNotOnCurve => "the point is not on the curve",
            EcError::CurveMismatch => "the points belong to different curves",
        };
        write!(f, "{}", err_msg)
    }
}
