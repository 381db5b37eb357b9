//! End-to-end rendering of applications with mounted engines

use std::cell::RefCell;
use std::rc::Rc;

use engine_router::{
    compile, AppError, Application, ControllerDefinition, EngineDefinition, HookError, HookOutcome, RouteDefinition,
    RouteMap, Template, TransitionError, Value, VisitOptions,
};
use futures::channel::oneshot;
use pretty_assertions::assert_eq;

type Log = Rc<RefCell<Vec<String>>>;
type Gate = Rc<RefCell<Option<oneshot::Receiver<()>>>>;

fn template(source: &str) -> Template {
    compile(source).expect("Should compile template")
}

fn blog_routes() -> RouteMap {
    RouteMap::build(|map| {
        map.route_with("post", |post| {
            post.route("comments");
            post.route("likes");
        });
    })
}

/// A blog engine with `post.comments` and `post.likes` and a `lang` query param
fn blog_engine(extra: impl Fn(&mut engine_router::Registry) + 'static) -> EngineDefinition {
    EngineDefinition::new().routes(blog_routes()).init(move |registry| {
        registry.register("application", template("Engine{{lang}}{{outlet}}"));
        registry.register(
            "application",
            ControllerDefinition::new()
                .query_params(["lang"])
                .property("lang", ""),
        );
        extra(registry);
    })
}

fn app_with_blog(blog: EngineDefinition) -> Application {
    let mut app = Application::new();
    app.register("application", template("Application{{outlet}}"));
    app.register("blog", blog);
    app.map(|map| {
        map.mount("blog");
    });
    app
}

/// A model hook that stays pending until the gate's sender fires
fn gated_model(gate: &Gate) -> RouteDefinition {
    let gate = gate.clone();
    RouteDefinition::new().model(move |_| {
        let receiver = gate.borrow_mut().take();
        HookOutcome::future(async move {
            if let Some(receiver) = receiver {
                receiver.await.map_err(|_| HookError::new("gate dropped"))?;
            }
            Ok(Value::Null)
        })
    })
}

fn gate() -> (Gate, oneshot::Sender<()>) {
    let (sender, receiver) = oneshot::channel();
    (Rc::new(RefCell::new(Some(receiver))), sender)
}

fn rejecting_model() -> RouteDefinition {
    RouteDefinition::new().model(|_| HookOutcome::reject(HookError::new("Oh, noes!")))
}

/// A model hook that records `entry` and resolves with `Null`
fn logged_model(log: &Log, entry: &'static str) -> RouteDefinition {
    let log = log.clone();
    RouteDefinition::new().model(move |_| log.borrow_mut().push(entry.to_string()))
}

/// Records every entering hook as `<name> before|model|after`; with a gate the
/// model hook stays pending until it opens and then resolves with `name`
fn logged_hooks(log: &Log, name: &'static str, gate: Option<Gate>) -> RouteDefinition {
    let (before, model, after) = (log.clone(), log.clone(), log.clone());
    RouteDefinition::new()
        .before_model(move |_| before.borrow_mut().push(format!("{name} before")))
        .model(move |_| {
            model.borrow_mut().push(format!("{name} model"));
            let receiver = gate.as_ref().and_then(|gate| gate.borrow_mut().take());
            HookOutcome::future(async move {
                if let Some(receiver) = receiver {
                    receiver.await.map_err(|_| HookError::new("gate dropped"))?;
                }
                Ok(Value::from(name))
            })
        })
        .after_model(move |ctx| after.borrow_mut().push(format!("{name} after {}", ctx.model())))
}

fn substate_of(err: AppError) -> Option<String> {
    match err {
        AppError::Transition(TransitionError::HookRejected { substate, .. }) => substate,
        other => panic!("expected a hook rejection, got {other:?}"),
    }
}

#[test]
fn test_engine_application_template() {
    let mut app = app_with_blog(EngineDefinition::new().init(|registry| {
        registry.register("application", template("Engine{{outlet}}"));
    }));
    app.visit_and_settle("/blog", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationEngine");
    assert_eq!(app.html(), "ApplicationEngine");
}

#[test]
fn test_engine_controller_properties() {
    let mut app = app_with_blog(EngineDefinition::new().init(|registry| {
        registry.register("application", template("<h2>Engine {{contextType}}</h2>{{outlet}}"));
        registry.register(
            "application",
            ControllerDefinition::new().property("contextType", "Engine"),
        );
    }));
    app.visit_and_settle("/blog", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationEngine Engine");
}

#[test]
fn test_shared_template_resolves_per_engine() {
    let shared = Rc::new(template("<h1>{{contextType}}</h1>{{ambiguous-curlies}}{{outlet}}"));
    let in_engine = shared.clone();

    let mut app = Application::new();
    app.register("application", shared.clone());
    app.register(
        "application",
        ControllerDefinition::new()
            .property("contextType", "Application")
            .on_init(|controller| controller.set("ambiguous-curlies", "Local Data!")),
    );
    app.register(
        "blog",
        EngineDefinition::new().init(move |registry| {
            registry.register("application", in_engine.clone());
            registry.register(
                "application",
                ControllerDefinition::new().property("contextType", "Engine"),
            );
            registry.register("components/ambiguous-curlies", template("<p>Component!</p>"));
        }),
    );
    app.map(|map| {
        map.mount("blog");
    });

    app.visit_and_settle("/blog", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationLocal Data!EngineComponent!");
    assert_eq!(
        app.html(),
        "<h1>Application</h1>Local Data!<h1>Engine</h1><p>Component!</p>"
    );
}

#[test]
fn test_partial_resolves_in_engine_registry() {
    let mut app = app_with_blog(EngineDefinition::new().init(|registry| {
        registry.register("application", template(r#"Engine {{partial "foo"}}"#));
        registry.register("foo", template("foo partial"));
    }));
    app.visit_and_settle("/blog", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationEngine foo partial");
}

#[test]
fn test_partial_missing_from_engine_is_an_error() {
    let mut app = app_with_blog(EngineDefinition::new().init(|registry| {
        registry.register("application", template(r#"{{partial "foo"}}"#));
    }));
    // Registered in the host only
    app.register("foo", template("host partial"));
    let err = app
        .visit_and_settle("/blog", VisitOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Render(engine_router::RenderError::MissingPartial { ref name, .. }) if name == "foo"
    ));
}

#[test]
fn test_render_error_surfaces_after_commit() {
    let mut app = app_with_blog(EngineDefinition::new().init(|registry| {
        registry.register("application", template(r#"{{partial "foo"}}"#));
    }));
    let navigation = app.visit("/blog", VisitOptions::default()).expect("Should start");
    let err = app.settle().unwrap_err();
    assert!(matches!(err, AppError::Render(_)));

    // The transition itself resolved and its routes stay committed
    assert_eq!(futures::executor::block_on(navigation), Ok(()));
    assert_eq!(app.current_url().as_deref(), Some("/blog"));
    assert_eq!(
        app.router().map(|r| r.active_routes()),
        Some(vec!["application".to_string(), "blog".to_string()])
    );
}

#[test]
fn test_engine_query_param() {
    let mut app = app_with_blog(blog_engine(|_| {}));
    app.visit_and_settle("/blog?lang=English", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationEngineEnglish");
    assert_eq!(app.current_url().as_deref(), Some("/blog?lang=English"));
}

#[test]
fn test_setting_query_param_rewrites_url() {
    let mut app = app_with_blog(blog_engine(|_| {}));
    app.visit_and_settle("/blog?lang=English", VisitOptions::default())
        .expect("Should visit");

    app.set("blog", "lang", "French").expect("Should set");
    assert_eq!(app.current_url().as_deref(), Some("/blog?lang=French"));
    app.settle().expect("Should settle");
    assert_eq!(app.text(), "ApplicationEngineFrench");

    app.set("blog", "lang", "").expect("Should set");
    assert_eq!(app.current_url().as_deref(), Some("/blog"));
    app.settle().expect("Should settle");
    assert_eq!(app.text(), "ApplicationEngine");
}

#[test]
fn test_set_on_inactive_route() {
    let mut app = app_with_blog(blog_engine(|_| {}));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");
    let err = app.set("blog", "lang", "French").unwrap_err();
    assert!(matches!(
        err,
        AppError::Transition(TransitionError::UnknownRoute { ref name }) if name == "blog"
    ));
}

#[test]
fn test_routeless_engine_renders_inline() {
    let mut app = Application::new();
    app.register("application", template(r#"Application{{mount "chat"}}"#));
    app.register(
        "chat",
        EngineDefinition::new().init(|registry| {
            registry.register("application", template("Chat {{greeting}}"));
            registry.register(
                "application",
                ControllerDefinition::new().property("greeting", "hi"),
            );
        }),
    );
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationChat hi");
}

#[test]
fn test_hooks_run_in_routable_engine() {
    let log: Log = Rc::default();
    let host_log = log.clone();
    let engine_log = log.clone();

    let mut app = app_with_blog(EngineDefinition::new().init(move |registry| {
        let engine_log = engine_log.clone();
        registry.register(
            "application",
            RouteDefinition::new().model(move |_| {
                engine_log.borrow_mut().push("engine - application".to_string());
            }),
        );
    }));
    app.register(
        "application",
        RouteDefinition::new().model(move |_| {
            host_log.borrow_mut().push("application - application".to_string());
        }),
    );

    app.visit_and_settle("/blog", VisitOptions::default())
        .expect("Should visit");
    assert_eq!(
        *log.borrow(),
        vec!["application - application", "engine - application"]
    );
}

#[test]
fn test_hooks_run_for_routeless_engine_at_render() {
    let log: Log = Rc::default();
    let host_log = log.clone();
    let engine_log = log.clone();

    let mut app = Application::new();
    app.register("application", template(r#"Application{{mount "chat"}}"#));
    app.register(
        "application",
        RouteDefinition::new().model(move |_| {
            host_log.borrow_mut().push("application - application".to_string());
        }),
    );
    app.register(
        "chat",
        EngineDefinition::new().init(move |registry| {
            let engine_log = engine_log.clone();
            registry.register(
                "application",
                ControllerDefinition::new().on_init(move |_| {
                    engine_log.borrow_mut().push("engine - application".to_string());
                }),
            );
        }),
    );

    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");
    assert_eq!(
        *log.borrow(),
        vec!["application - application", "engine - application"]
    );
}

#[test]
fn test_visit_without_rendering_runs_hooks() {
    let log: Log = Rc::default();
    let engine_log = log.clone();
    let mut app = app_with_blog(EngineDefinition::new().init(move |registry| {
        let engine_log = engine_log.clone();
        registry.register("application", template("Engine"));
        registry.register(
            "application",
            RouteDefinition::new().model(move |_| {
                engine_log.borrow_mut().push("engine - application".to_string());
            }),
        );
    }));

    app.visit_and_settle("/blog", VisitOptions::new().with_should_render(false))
        .expect("Should visit");
    assert_eq!(app.text(), "");
    assert_eq!(*log.borrow(), vec!["engine - application"]);
}

#[test]
fn test_deactivate_runs_before_destroy() {
    let seen: Rc<RefCell<Vec<(bool, bool)>>> = Rc::default();
    let observed = seen.clone();
    let mut app = app_with_blog(EngineDefinition::new().init(move |registry| {
        let observed = observed.clone();
        registry.register(
            "application",
            RouteDefinition::new().deactivate(move |handler| {
                observed
                    .borrow_mut()
                    .push((handler.is_destroying(), handler.is_destroyed()));
            }),
        );
    }));

    app.visit_and_settle("/blog", VisitOptions::default())
        .expect("Should visit");
    app.destroy();
    assert_eq!(*seen.borrow(), vec![(false, false)]);
    assert!(!app.is_booted());
    assert_eq!(app.text(), "");
}

#[test]
fn test_exit_and_enter_order() {
    let log: Log = Rc::default();
    let hooks = log.clone();
    let mut app = app_with_blog(blog_engine(move |registry| {
        for name in ["post", "post.comments", "post.likes"] {
            let (enter, exit) = (hooks.clone(), hooks.clone());
            registry.register(
                name,
                RouteDefinition::new()
                    .activate(move |handler| enter.borrow_mut().push(format!("activate {}", handler.name())))
                    .deactivate(move |handler| exit.borrow_mut().push(format!("deactivate {}", handler.name()))),
            );
        }
    }));

    app.visit_and_settle("/blog/post/comments", VisitOptions::default())
        .expect("Should visit");
    log.borrow_mut().clear();

    let navigation = app.transition_to("blog.post.likes").expect("Should start");
    app.block_on(navigation).expect("Should transition");
    assert_eq!(
        *log.borrow(),
        vec!["deactivate blog.post.comments", "activate blog.post.likes"]
    );

    log.borrow_mut().clear();
    let navigation = app.transition_to("application").expect("Should start");
    app.block_on(navigation).expect("Should transition");
    assert_eq!(
        *log.borrow(),
        vec!["deactivate blog.post.likes", "deactivate blog.post"]
    );
}

#[test]
fn test_error_substate_beside_engine() {
    let log: Log = Rc::default();
    let hooks = log.clone();
    let mut app = app_with_blog(
        blog_engine(move |registry| {
            let post = hooks.clone();
            registry.register("application", logged_model(&hooks, "engine"));
            registry.register(
                "post",
                RouteDefinition::new().model(move |_| {
                    post.borrow_mut().push("post".to_string());
                    HookOutcome::reject(HookError::new("Oh, noes!"))
                }),
            );
            registry.register("post.comments", logged_model(&hooks, "comments"));
            registry.register("application_error", template("Error! {{model.message}}"));
        })
        .module_based(true),
    );
    app.register("application", logged_model(&log, "application"));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");
    assert_eq!(app.text(), "Application");
    log.borrow_mut().clear();

    let navigation = app.transition_to("blog.post.comments").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert_eq!(substate_of(err).as_deref(), Some("blog_error"));
    insta::assert_snapshot!(app.text(), @"ApplicationError! Oh, noes!");
    // Only hooks above and at the rejecting route ran
    assert_eq!(*log.borrow(), vec!["engine", "post"]);
}

#[test]
fn test_error_substate_keeps_committed_url() {
    let mut app = app_with_blog(
        blog_engine(|registry| {
            registry.register("post", rejecting_model());
            registry.register("application_error", template("Error! {{model.message}}"));
        })
        .module_based(true),
    );
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");
    assert_eq!(app.current_url().as_deref(), Some("/"));

    let navigation = app.transition_to("blog.post").expect("Should start");
    app.block_on(navigation).unwrap_err();
    assert_eq!(app.text(), "ApplicationError! Oh, noes!");
    assert_eq!(app.current_url().as_deref(), Some("/"));
    assert_eq!(
        app.router().map(|r| r.active_routes()),
        Some(vec!["application".to_string()])
    );
}

#[test]
fn test_error_substate_in_engine() {
    let mut app = app_with_blog(blog_engine(|registry| {
        registry.register("post", rejecting_model());
        registry.register("error", template("Error! {{model.message}}"));
    }));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert_eq!(substate_of(err).as_deref(), Some("blog.error"));
    insta::assert_snapshot!(app.text(), @"ApplicationEngineError! Oh, noes!");
}

#[test]
fn test_error_substate_beside_route() {
    let mut app = app_with_blog(
        blog_engine(|registry| {
            registry.register("post", rejecting_model());
            registry.register("post_error", template("Error! {{model.message}}"));
        })
        .module_based(true),
    );
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert_eq!(substate_of(err).as_deref(), Some("blog.post_error"));
    insta::assert_snapshot!(app.text(), @"ApplicationEngineError! Oh, noes!");
}

#[test]
fn test_sibling_error_substate_needs_module_based_engine() {
    let mut app = app_with_blog(blog_engine(|registry| {
        registry.register("post", rejecting_model());
        registry.register("post_error", template("Error! {{model.message}}"));
    }));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert_eq!(substate_of(err), None);
    assert_eq!(app.text(), "Application");
}

#[test]
fn test_nested_error_substate() {
    let mut app = app_with_blog(blog_engine(|registry| {
        registry.register("post.comments", rejecting_model());
        registry.register("post.error", template("Error! {{model.message}}"));
    }));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post.comments").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert_eq!(substate_of(err).as_deref(), Some("blog.post.error"));
    insta::assert_snapshot!(app.text(), @"ApplicationEngineError! Oh, noes!");
}

#[test]
fn test_loading_substate_beside_engine() {
    let (gate, open) = gate();
    let log: Log = Rc::default();
    let model = gate.clone();
    let hooks = log.clone();
    let mut app = app_with_blog(
        blog_engine(move |registry| {
            registry.register("application", logged_model(&hooks, "engine"));
            registry.register("post", gated_model(&model));
            registry.register("post", template("Post"));
            registry.register("application_loading", template("Loading"));
        })
        .module_based(true),
    );
    app.register("application", logged_model(&log, "application"));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post").expect("Should start");
    app.settle().expect("Should settle");
    insta::assert_snapshot!(app.text(), @"ApplicationLoading");
    assert_eq!(*log.borrow(), vec!["application", "engine"]);

    open.send(()).expect("Should open gate");
    app.block_on(navigation).expect("Should transition");
    insta::assert_snapshot!(app.text(), @"ApplicationEnginePost");
    assert_eq!(*log.borrow(), vec!["application", "engine"]);
}

#[test]
fn test_entering_hooks_run_per_route_parent_first() {
    let (gate, open) = gate();
    let log: Log = Rc::default();
    let hooks = log.clone();
    let mut app = app_with_blog(blog_engine(move |registry| {
        registry.register("application", logged_hooks(&hooks, "engine", None));
        registry.register("post", logged_hooks(&hooks, "post", None));
    }));
    app.register("application", logged_hooks(&log, "app", Some(gate)));

    let navigation = app.visit("/blog/post", VisitOptions::default()).expect("Should start");
    app.settle().expect("Should settle");
    assert_eq!(*log.borrow(), vec!["app before", "app model"]);
    assert_eq!(app.text(), "");

    open.send(()).expect("Should open gate");
    app.block_on(navigation).expect("Should transition");
    assert_eq!(
        *log.borrow(),
        vec![
            "app before",
            "app model",
            "app after app",
            "engine before",
            "engine model",
            "engine after engine",
            "post before",
            "post model",
            "post after post",
        ]
    );
    assert_eq!(app.text(), "ApplicationEngine");
}

#[test]
fn test_loading_substate_in_engine() {
    let (gate, open) = gate();
    let model = gate.clone();
    let mut app = app_with_blog(blog_engine(move |registry| {
        registry.register("post", gated_model(&model));
        registry.register("post", template("Post"));
        registry.register("loading", template("Loading"));
    }));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post").expect("Should start");
    app.settle().expect("Should settle");
    insta::assert_snapshot!(app.text(), @"ApplicationEngineLoading");

    open.send(()).expect("Should open gate");
    app.block_on(navigation).expect("Should transition");
    insta::assert_snapshot!(app.text(), @"ApplicationEnginePost");
}

fn likes_app(loading: &'static str, module_based: bool) -> (Application, oneshot::Sender<()>) {
    let (gate, open) = gate();
    let model = gate.clone();
    let app = app_with_blog(
        blog_engine(move |registry| {
            registry.register("post", template("{{outlet}}"));
            registry.register("post.comments", template("Comments"));
            registry.register("post.likes", template("Likes"));
            registry.register("post.likes", gated_model(&model));
            registry.register(loading, template("Loading"));
        })
        .module_based(module_based),
    );
    (app, open)
}

#[test]
fn test_loading_substate_beside_nested_route() {
    let (mut app, open) = likes_app("post.likes_loading", true);
    app.visit_and_settle("/blog/post/comments", VisitOptions::default())
        .expect("Should visit");
    assert_eq!(app.text(), "ApplicationEngineComments");

    let navigation = app.transition_to("blog.post.likes").expect("Should start");
    app.settle().expect("Should settle");
    insta::assert_snapshot!(app.text(), @"ApplicationEngineLoading");

    open.send(()).expect("Should open gate");
    app.block_on(navigation).expect("Should transition");
    insta::assert_snapshot!(app.text(), @"ApplicationEngineLikes");
}

#[test]
fn test_loading_substate_under_nested_route() {
    let (mut app, open) = likes_app("post.loading", false);
    app.visit_and_settle("/blog/post/comments", VisitOptions::default())
        .expect("Should visit");

    let navigation = app.transition_to("blog.post.likes").expect("Should start");
    app.settle().expect("Should settle");
    insta::assert_snapshot!(app.text(), @"ApplicationEngineLoading");

    open.send(()).expect("Should open gate");
    app.block_on(navigation).expect("Should transition");
    insta::assert_snapshot!(app.text(), @"ApplicationEngineLikes");
    assert_eq!(app.current_url().as_deref(), Some("/blog/post/likes"));
}

#[test]
fn test_superseded_transition_applies_nothing() {
    let (gate, open) = gate();
    let model = gate.clone();
    let mut app = app_with_blog(blog_engine(move |registry| {
        registry.register("post", gated_model(&model));
        registry.register("post", template("Post"));
    }));
    app.visit_and_settle("/", VisitOptions::default())
        .expect("Should visit");

    let slow = app.transition_to("blog.post").expect("Should start");
    app.settle().expect("Should settle");
    assert!(app.router().is_some_and(|r| r.is_transitioning()));

    let fast = app.visit("/blog", VisitOptions::default()).expect("Should start");
    app.block_on(fast).expect("Should transition");
    // The first caller was handed to the superseding transition
    app.block_on(slow).expect("Should settle with its successor");

    open.send(()).expect("Should open gate");
    app.settle().expect("Should settle");
    assert_eq!(app.text(), "ApplicationEngine");
    assert_eq!(app.current_url().as_deref(), Some("/blog"));
}

#[test]
fn test_redirect_from_before_model() {
    let mut app = app_with_blog(blog_engine(|registry| {
        registry.register("post", template("Post"));
    }));
    app.register(
        "old",
        RouteDefinition::new().before_model(|ctx| ctx.transition_to("blog.post")),
    );
    app.map(|map| {
        map.route("old");
    });

    app.visit_and_settle("/old", VisitOptions::default())
        .expect("Should follow the redirect");
    assert_eq!(app.current_url().as_deref(), Some("/blog/post"));
    assert_eq!(app.text(), "ApplicationEnginePost");
    assert_eq!(
        app.router().map(|r| r.active_routes()),
        Some(vec![
            "application".to_string(),
            "blog".to_string(),
            "blog.post".to_string()
        ])
    );
}

#[test]
fn test_dynamic_segments() {
    let mut app = Application::new();
    app.register("application", template("Application{{outlet}}"));
    app.register("post", template("Post {{model.id}}"));
    app.register(
        "post",
        RouteDefinition::new().model(|ctx| Value::map([("id", ctx.param("post_id").unwrap_or_default())])),
    );
    app.map(|map| {
        map.route_at("post", "/post/:post_id", |_| {});
    });

    app.visit_and_settle("/post/7", VisitOptions::default())
        .expect("Should visit");
    insta::assert_snapshot!(app.text(), @"ApplicationPost 7");

    let params = [("post_id".to_string(), "8".to_string())].into_iter().collect();
    let navigation = app
        .transition_with_params("post", params)
        .expect("Should start");
    app.block_on(navigation).expect("Should transition");
    assert_eq!(app.text(), "ApplicationPost 8");
    assert_eq!(app.current_url().as_deref(), Some("/post/8"));
}

#[test]
fn test_missing_dynamic_segment() {
    let mut app = Application::new();
    app.map(|map| {
        map.route_at("post", "/post/:post_id", |_| {});
    });
    let navigation = app.transition_to("post").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert!(matches!(
        err,
        AppError::Transition(TransitionError::MissingParameter { ref param, .. }) if param == "post_id"
    ));
}

#[test]
fn test_unknown_route_name() {
    let mut app = app_with_blog(blog_engine(|_| {}));
    let navigation = app.transition_to("blog.nope").expect("Should start");
    let err = app.block_on(navigation).unwrap_err();
    assert_eq!(
        err.to_string(),
        "transition failed: no route named 'blog.nope'"
    );
}

#[test]
fn test_mount_alias_and_path() {
    let mut app = Application::new();
    app.register("application", template("Application{{outlet}}"));
    app.register(
        "blog",
        EngineDefinition::new().init(|registry| {
            registry.register("application", template("Engine"));
        }),
    );
    app.map(|map| {
        map.mount_as("blog", "news", Some("/articles".to_string()));
    });

    app.visit_and_settle("/articles", VisitOptions::default())
        .expect("Should visit");
    assert_eq!(app.text(), "ApplicationEngine");
    assert_eq!(
        app.router().map(|r| r.active_routes()),
        Some(vec!["application".to_string(), "news".to_string()])
    );
}

#[test]
fn test_retained_outlets_on_sibling_transition() {
    let (mut app, _open) = likes_app("post.loading", false);
    app.visit_and_settle("/blog/post/comments", VisitOptions::default())
        .expect("Should visit");
    let navigation = app.transition_to("blog.post").expect("Should start");
    app.block_on(navigation).expect("Should transition");

    let render = app.last_render().expect("Should have rendered");
    assert_eq!(render.retained, vec![0, 1, 2]);
    assert_eq!(render.replaced, vec![3]);
    assert_eq!(app.text(), "ApplicationEngine");
}
