use crate::mutation::Mutator;

pub(crate) struct ApiServerState {
    pub(crate) mutator: Mutator,
}
