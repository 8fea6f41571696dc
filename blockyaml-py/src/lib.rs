use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyDict, PyFloat, PyInt, PyList, PyModule, PyString};

use blockyaml_core::{ParseError, Parser, YamlValue};

fn yaml_to_py(py: Python<'_>, v: &YamlValue) -> PyResult<Py<PyAny>> {
    match v {
        YamlValue::Null => Ok(py.None()),
        YamlValue::Bool(b) => Ok(PyBool::new(py, *b).to_owned().into_any().unbind()),
        YamlValue::Int(i) => Ok(PyInt::new(py, *i).into_any().unbind()),
        YamlValue::Float(f) => Ok(PyFloat::new(py, *f).into_any().unbind()),
        YamlValue::Str(s) => Ok(PyString::new(py, s).unbind().into()),
        YamlValue::Seq(seq) => {
            let list = PyList::empty(py);
            for item in seq {
                list.append(yaml_to_py(py, item)?)?;
            }
            Ok(list.unbind().into())
        }
        YamlValue::Map(map) => {
            let dict = PyDict::new(py);
            for (k, v2) in map {
                dict.set_item(k, yaml_to_py(py, v2)?)?;
            }
            Ok(dict.unbind().into())
        }
    }
}

fn to_py_err(err: ParseError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(format!("{}: {err}", err.kind()))
}

#[pyfunction]
fn loads(py: Python<'_>, s: &str) -> PyResult<Py<PyAny>> {
    let value = Parser::default().parse(s).map_err(to_py_err)?;
    yaml_to_py(py, &value)
}

#[pyfunction]
fn loads_bytes(py: Python<'_>, data: &[u8]) -> PyResult<Py<PyAny>> {
    let value = Parser::default().parse_bytes(data).map_err(to_py_err)?;
    yaml_to_py(py, &value)
}

#[pymodule]
fn _blockyaml_native(_py: Python<'_>, m: Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(loads, &m)?)?;
    m.add_function(wrap_pyfunction!(loads_bytes, &m)?)?;
    Ok(())
}
