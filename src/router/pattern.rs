//! # Patrones de Ruta
//! src/router/pattern.rs
//!
//! Un patrón es una secuencia de segmentos separados por `/`. Cada segmento
//! es literal (`services`) o un parámetro (`{name}`).
//!
//! ```text
//! /api/services/{name}/start
//!  │     │        │      └─ literal
//!  │     │        └──────── parámetro "name"
//!  └─────┴───────────────── literales
//! ```

use std::collections::HashMap;

/// Segmento de un patrón
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Patrón de ruta ya separado en segmentos
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parsea un patrón como `/api/services/{name}`
    ///
    /// Los segmentos vacíos (barras dobles o finales) se ignoran.
    pub fn parse(raw: &str) -> Self {
        let segments = split_segments(raw)
            .map(|part| {
                if part.len() >= 2 && part.starts_with('{') && part.ends_with('}') {
                    Segment::Param(part[1..part.len() - 1].to_string())
                } else {
                    Segment::Literal(part.to_string())
                }
            })
            .collect();

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// El patrón tal como se registró
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Indica si el patrón tiene al menos un `{param}`
    pub fn is_parameterized(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// Intenta hacer match con un path concreto
    ///
    /// Retorna los parámetros capturados si la cantidad de segmentos coincide
    /// y todos los literales son iguales.
    ///
    /// # Ejemplo
    /// ```
    /// use rest_api_server::router::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("/api/services/{name}");
    /// let params = pattern.matches("/api/services/cache1").unwrap();
    /// assert_eq!(params["name"], "cache1");
    ///
    /// assert!(pattern.matches("/api/services").is_none());
    /// ```
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal != part => return None,
                Segment::Literal(_) => {}
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        Some(params)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
