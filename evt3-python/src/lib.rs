//! Python bindings for the EVT 3.0 decoder with zero-copy numpy support.
//!
//! Decoded columns are moved into numpy arrays once, when the result object is
//! built; attribute access afterwards hands out references to those arrays.

use evt3_core::{
    DecodeError, DecodeResult, DecoderConfig, Evt3Decoder, TriggerResult, DEFAULT_SENSOR_HEIGHT,
    DEFAULT_SENSOR_WIDTH,
};
use numpy::{IntoPyArray, PyArray1};
use pyo3::exceptions::{PyIOError, PyMemoryError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn to_py_err(err: DecodeError) -> PyErr {
    match err {
        DecodeError::Io(e) => PyIOError::new_err(format!("Failed to decode file: {}", e)),
        DecodeError::Allocation { .. } => PyMemoryError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Container for decoded CD events with zero-copy numpy access.
#[pyclass]
pub struct Events {
    x: Py<PyArray1<u16>>,
    y: Py<PyArray1<u16>>,
    polarity: Py<PyArray1<u8>>,
    timestamp: Py<PyArray1<u64>>,
    len: usize,
    sensor_width: u32,
    sensor_height: u32,
}

#[pymethods]
impl Events {
    fn __len__(&self) -> usize {
        self.len
    }

    fn __repr__(&self) -> String {
        format!(
            "Events(count={}, sensor={}x{})",
            self.len, self.sensor_width, self.sensor_height
        )
    }

    /// X coordinates (uint16).
    #[getter]
    fn x(&self, py: Python<'_>) -> Py<PyArray1<u16>> {
        self.x.clone_ref(py)
    }

    /// Y coordinates (uint16).
    #[getter]
    fn y(&self, py: Python<'_>) -> Py<PyArray1<u16>> {
        self.y.clone_ref(py)
    }

    /// Polarities (uint8): 0 = OFF, 1 = ON.
    #[getter]
    fn polarity(&self, py: Python<'_>) -> Py<PyArray1<u8>> {
        self.polarity.clone_ref(py)
    }

    /// Alias for polarity.
    #[getter]
    fn p(&self, py: Python<'_>) -> Py<PyArray1<u8>> {
        self.polarity.clone_ref(py)
    }

    /// Timestamps (uint64) in microseconds.
    #[getter]
    fn timestamp(&self, py: Python<'_>) -> Py<PyArray1<u64>> {
        self.timestamp.clone_ref(py)
    }

    /// Alias for timestamp.
    #[getter]
    fn t(&self, py: Python<'_>) -> Py<PyArray1<u64>> {
        self.timestamp.clone_ref(py)
    }

    #[getter]
    fn sensor_width(&self) -> u32 {
        self.sensor_width
    }

    #[getter]
    fn sensor_height(&self) -> u32 {
        self.sensor_height
    }

    /// (width, height) of the sensor.
    #[getter]
    fn sensor_size(&self) -> (u32, u32) {
        (self.sensor_width, self.sensor_height)
    }

    /// All arrays keyed by column name, suitable for `pandas.DataFrame`.
    fn to_dict(&self, py: Python<'_>) -> PyResult<PyObject> {
        let dict = PyDict::new(py);
        dict.set_item("x", self.x.clone_ref(py))?;
        dict.set_item("y", self.y.clone_ref(py))?;
        dict.set_item("polarity", self.polarity.clone_ref(py))?;
        dict.set_item("timestamp", self.timestamp.clone_ref(py))?;
        Ok(dict.into())
    }
}

impl Events {
    fn from_result(py: Python<'_>, result: DecodeResult) -> Self {
        let (width, height) = result.sensor_size();
        let len = result.len();
        let (x, y, polarity, timestamp) = result.into_columns();
        Self {
            x: x.into_pyarray(py).to_owned(),
            y: y.into_pyarray(py).to_owned(),
            polarity: polarity.into_pyarray(py).to_owned(),
            timestamp: timestamp.into_pyarray(py).to_owned(),
            len,
            sensor_width: width,
            sensor_height: height,
        }
    }
}

/// Container for decoded trigger events.
#[pyclass]
pub struct TriggerEvents {
    channel: Py<PyArray1<u8>>,
    polarity: Py<PyArray1<u8>>,
    timestamp: Py<PyArray1<u64>>,
    len: usize,
}

#[pymethods]
impl TriggerEvents {
    fn __len__(&self) -> usize {
        self.len
    }

    fn __repr__(&self) -> String {
        format!("Triggers(count={})", self.len)
    }

    /// Trigger channel IDs.
    #[getter]
    fn channel(&self, py: Python<'_>) -> Py<PyArray1<u8>> {
        self.channel.clone_ref(py)
    }

    /// Edge polarities: 0 = falling, 1 = rising.
    #[getter]
    fn polarity(&self, py: Python<'_>) -> Py<PyArray1<u8>> {
        self.polarity.clone_ref(py)
    }

    #[getter]
    fn p(&self, py: Python<'_>) -> Py<PyArray1<u8>> {
        self.polarity.clone_ref(py)
    }

    #[getter]
    fn timestamp(&self, py: Python<'_>) -> Py<PyArray1<u64>> {
        self.timestamp.clone_ref(py)
    }

    #[getter]
    fn t(&self, py: Python<'_>) -> Py<PyArray1<u64>> {
        self.timestamp.clone_ref(py)
    }

    fn to_dict(&self, py: Python<'_>) -> PyResult<PyObject> {
        let dict = PyDict::new(py);
        dict.set_item("channel", self.channel.clone_ref(py))?;
        dict.set_item("polarity", self.polarity.clone_ref(py))?;
        dict.set_item("timestamp", self.timestamp.clone_ref(py))?;
        Ok(dict.into())
    }
}

impl TriggerEvents {
    fn from_result(py: Python<'_>, result: TriggerResult) -> Self {
        let len = result.len();
        let (channel, polarity, timestamp) = result.into_columns();
        Self {
            channel: channel.into_pyarray(py).to_owned(),
            polarity: polarity.into_pyarray(py).to_owned(),
            timestamp: timestamp.into_pyarray(py).to_owned(),
            len,
        }
    }
}

/// Decodes an EVT 3.0 raw file and returns the events.
///
/// Args:
///     path: Path to the .raw file
///     sensor_width: Sensor width; defaults to the file header geometry
///     sensor_height: Sensor height; defaults to the file header geometry
///
/// Example:
///     >>> import evt3
///     >>> events = evt3.decode_file("recording.raw")
///     >>> x = events.x
#[pyfunction]
#[pyo3(signature = (path, sensor_width=None, sensor_height=None))]
fn decode_file(
    py: Python<'_>,
    path: &str,
    sensor_width: Option<u32>,
    sensor_height: Option<u32>,
) -> PyResult<Py<Events>> {
    let (events, _) = decode_path(py, path, sensor_width, sensor_height)?;
    Py::new(py, Events::from_result(py, events))
}

/// Decodes an EVT 3.0 raw file and returns `(Events, TriggerEvents)`.
#[pyfunction]
#[pyo3(signature = (path, sensor_width=None, sensor_height=None))]
fn decode_file_with_triggers(
    py: Python<'_>,
    path: &str,
    sensor_width: Option<u32>,
    sensor_height: Option<u32>,
) -> PyResult<(Py<Events>, Py<TriggerEvents>)> {
    let (events, triggers) = decode_path(py, path, sensor_width, sensor_height)?;
    Ok((
        Py::new(py, Events::from_result(py, events))?,
        Py::new(py, TriggerEvents::from_result(py, triggers))?,
    ))
}

fn decode_path(
    py: Python<'_>,
    path: &str,
    sensor_width: Option<u32>,
    sensor_height: Option<u32>,
) -> PyResult<(DecodeResult, TriggerResult)> {
    py.allow_threads(|| match (sensor_width, sensor_height) {
        (Some(w), Some(h)) => {
            Evt3Decoder::with_config(DecoderConfig::for_sensor(w, h)).decode_file_as_configured(path)
        }
        _ => Evt3Decoder::new().decode_file(path),
    })
    .map_err(to_py_err)
}

/// Decodes raw EVT 3.0 bytes (no file header) and returns events.
///
/// Args:
///     data: Raw bytes containing EVT 3.0 words
///     sensor_width: Sensor width in pixels (default: 1280)
///     sensor_height: Sensor height in pixels (default: 720)
///     lenient: Skip words with reserved type nibbles instead of failing
#[pyfunction]
#[pyo3(signature = (data, sensor_width=DEFAULT_SENSOR_WIDTH, sensor_height=DEFAULT_SENSOR_HEIGHT, lenient=false))]
fn decode_bytes(
    py: Python<'_>,
    data: &[u8],
    sensor_width: u32,
    sensor_height: u32,
    lenient: bool,
) -> PyResult<Py<Events>> {
    let mut config = DecoderConfig::for_sensor(sensor_width, sensor_height);
    if lenient {
        config = config.lenient();
    }
    let (events, _) = Evt3Decoder::with_config(config)
        .decode_bytes(data)
        .map_err(to_py_err)?;
    Py::new(py, Events::from_result(py, events))
}

/// EVT 3.0 decoder module for Python.
#[pymodule]
fn _evt3(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode_file, m)?)?;
    m.add_function(wrap_pyfunction!(decode_file_with_triggers, m)?)?;
    m.add_function(wrap_pyfunction!(decode_bytes, m)?)?;
    m.add_class::<Events>()?;
    m.add_class::<TriggerEvents>()?;
    Ok(())
}
