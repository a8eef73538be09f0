mod test_peer_failure;
mod test_track_propagation;
