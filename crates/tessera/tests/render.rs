//! End-to-end rendering through the public API.

use std::cell::Cell;
use std::rc::Rc;

use tessera::atelier::{
    choice, condition, unsafe_html, when, Context, RenderFn, Root, Scope, StateHandle, TaskQueue,
    TemplateResult, Updater, Value,
};
use tessera::fresco::Surface;
use tessera::html;

struct App {
    surface: Surface,
    updater: Updater,
    queue: Rc<TaskQueue>,
}

impl App {
    fn new(scope: Scope) -> Self {
        let surface = Surface::new();
        let queue = Rc::new(TaskQueue::new());
        let updater = Updater::new(surface.clone(), Rc::new(scope), queue.clone());
        Self {
            surface,
            updater,
            queue,
        }
    }

    fn html(&self) -> String {
        self.surface.inner_html(self.surface.root())
    }

    fn settle(&self) -> usize {
        self.queue.run_until_idle()
    }
}

fn profile() -> RenderFn {
    RenderFn::new(|props: &Value, cx: &mut Context<'_>| {
        let followers = props.as_number().unwrap_or_default();
        if followers < 1000.0 {
            html!(cx, ["<div class=profile><span>", "</span></div>"], followers)
        } else {
            html!(
                cx,
                ["<article class=", "><h2>Popular</h2><p>", "</p></article>"],
                "popular",
                followers
            )
        }
    })
}

#[test]
fn t1_t2_scenario_reuses_mount_point() {
    let app = App::new(Scope::default());
    let render = profile();
    let mut root = Root::render(
        Value::component(render.clone(), 1),
        app.surface.root(),
        &app.updater,
    )
    .unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @r#"<div class="profile"><span>1<!----></span></div><!---->"#);

    app.surface.reset_stats();
    root.update(Value::component(render.clone(), 2)).unwrap();
    app.settle();
    let stats = app.surface.stats();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.mutations(), 1);
    insta::assert_snapshot!(app.html(), @r#"<div class="profile"><span>2<!----></span></div><!---->"#);

    root.update(Value::component(render.clone(), 5000)).unwrap();
    app.settle();
    insta::assert_snapshot!(
        app.html(),
        @r#"<article class="popular"><h2>Popular</h2><p>5000<!----></p></article><!---->"#
    );

    app.surface.reset_stats();
    root.update(Value::component(render, 3)).unwrap();
    app.settle();
    assert_eq!(app.surface.stats().created, 0);
    assert_eq!(app.updater.scope().template_count(), 2);
    insta::assert_snapshot!(app.html(), @r#"<div class="profile"><span>3<!----></span></div><!---->"#);
}

#[test]
fn state_updates_are_batched_per_tick() {
    let app = App::new(Scope::default());
    let renders = Rc::new(Cell::new(0));
    let handle_slot: Rc<std::cell::RefCell<Option<StateHandle<u32>>>> = Rc::default();

    let (count, slot) = (renders.clone(), handle_slot.clone());
    let counter = RenderFn::new(move |_: &Value, cx: &mut Context<'_>| {
        count.set(count.get() + 1);
        let (clicks, handle) = cx.use_state(|| 0u32)?;
        *slot.borrow_mut() = Some(handle.clone());
        let on_click = Value::handler(move |_| handle.update(|n| *n += 1));
        html!(cx, ["<button @click=", ">clicked ", "</button>"], on_click, clicks)
    });

    let _root = Root::render(Value::component(counter, Value::Null), app.surface.root(), &app.updater)
        .unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @"<button>clicked 0<!----></button><!---->");

    let button = app.surface.children(app.surface.root())[0];
    for _ in 0..3 {
        app.surface.dispatch(button, "click");
    }
    assert_eq!(app.queue.len(), 1);
    app.settle();

    assert_eq!(renders.get(), 2);
    assert_eq!(handle_slot.borrow().as_ref().map(StateHandle::get), Some(3));
    insta::assert_snapshot!(app.html(), @"<button>clicked 3<!----></button><!---->");
}

fn tabs(scope: &Scope, active: &'static str, show_footer: bool) -> TemplateResult {
    let panel = choice(active, |key: &&'static str| match *key {
        "raw" => unsafe_html("<b>raw</b> markup"),
        other => Value::from(format!("panel {other}")),
    });
    let footer = when(show_footer, "footer");
    html!(scope, ["<main>", "</main><footer>", "</footer>"], panel, footer).unwrap()
}

#[test]
fn directives_compose() {
    let app = App::new(Scope::default());
    let scope = app.updater.scope().clone();
    let mut root = Root::render(tabs(&scope, "home", false), app.surface.root(), &app.updater).unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @"<main>panel home<!----></main><footer><!----></footer><!---->");

    root.update(tabs(&scope, "raw", true)).unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @"<main><b>raw</b> markup<!----></main><footer>footer<!----></footer><!---->");

    root.update(tabs(&scope, "home", true)).unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @"<main>panel home<!----></main><footer>footer<!----></footer><!---->");

    root.update(condition(true, "replaced", Value::Null)).unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @"replaced<!---->");

    root.unmount();
    app.settle();
    assert_eq!(app.html(), "");
}

#[test]
fn configured_marker_is_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(tessera::config::CONFIG_FILE),
        r#"{ "template": { "marker": "%%slot%%" } }"#,
    )
    .unwrap();
    let config = tessera::load_config(Some(dir.path()));
    let app = App::new(Scope::new(config.scope_options()));

    let result = html!(app.updater.scope(), ["<p title=", ">", "</p>"], "t", "body").unwrap();
    assert_eq!(result.template.descriptors().len(), 2);
    let _root = Root::render(result, app.surface.root(), &app.updater).unwrap();
    app.settle();
    insta::assert_snapshot!(app.html(), @r#"<p title="t">body<!----></p><!---->"#);
}
