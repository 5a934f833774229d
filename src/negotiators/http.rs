use async_trait::async_trait;

use super::NegotiatorTrait;

/// A negotiator for plain HTTP forward proxying.
///
/// Nothing is exchanged up front: the proxy receives the request with the
/// absolute URI on the request line and forwards it itself.
pub struct HttpNegotiator;

#[async_trait]
impl NegotiatorTrait for HttpNegotiator {}
