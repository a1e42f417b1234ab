pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    CheckPathUseCase, ComputeRunner, ComputeWhitelistUseCase, ConfigChange, ConfigRegistry,
    EventBus, ListStatusUseCase, LocalCatalog, PredicateStore, RemoteListing, RemoteListingClient,
    Subscription, UpdateScheduler, WhitelistConfig, WhitelistService,
};

pub use connector::{
    FilePredicateStore, FsLocalCatalog, HttpRemoteListingClient, InMemoryConfigRegistry,
    InMemoryPredicateStore, MockRemoteBehavior, MockRemoteListingClient, StaticCatalog,
    load_topology,
};

pub use domain::{
    DomainError, PathPredicate, PathSet, PathVerdict, PredicateStatus, RepositoryConfig,
    RepositoryId, RepositoryKind, WhitelistEvent,
};
