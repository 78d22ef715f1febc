pub mod shared {
    pub mod core {
        pub mod correlation;
        pub mod requester;
    }
    pub mod infrastructure {
        pub mod circuit_breaker;
        pub mod message_channel;
    }
}

pub mod modules {
    pub mod workload {
        pub mod core {
            pub mod event;
            pub mod evolve;
            pub mod ports;
            pub mod summary;
        }
        pub mod use_cases {
            pub mod publish_workload {
                pub mod guarded;
                pub mod handler;
                pub mod publisher;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod apply_workload {
                pub mod aggregator;
                pub mod consumer;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_trainer_summary {
                pub mod handler;
                pub mod inbound {
                    pub mod graphql;
                    pub mod http;
                }
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod channel_publisher;
                pub mod summary_store_in_memory;
            }
        }
    }
}

pub mod shell;
